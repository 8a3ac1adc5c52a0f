// Probability-based targeting over the opponent view.
// Stays no_std and avoids heap allocations.

use crate::core::board::TheirBoard;
use crate::core::config::BOARD_SIZE;
use crate::core::ship::Orientation;
use rand::Rng;

const GRID_SIZE: usize = BOARD_SIZE as usize;

/// Placements covering observed hits get this much weight per hit, so cells
/// next to a wounded ship dominate the distribution.
const HIT_BIAS: f64 = 10.0;

/// Sampling temperature used by [`calc_pdf_and_guess`]. Values below 1 sharpen
/// the distribution towards its peaks.
const TEMPERATURE: f64 = 0.5;

pub type Pdf = [[f64; GRID_SIZE]; GRID_SIZE];

/// Compute a probability density over all unshot cells.
///
/// Every placement of every unsunk enemy ship that avoids known misses and
/// the wrecks of sunk ships adds weight to the unshot cells it covers, more
/// for each open hit it passes through. The result is normalized to sum to 1.
pub fn calc_pdf(view: &TheirBoard) -> Pdf {
    let hits = view.hits();
    let blocked = view.misses() | view.sunk_cells();
    let mut matrix = [[0.0f64; GRID_SIZE]; GRID_SIZE];

    for len in view.remaining_lengths() {
        if len == 0 {
            continue;
        }
        for orient in Orientation::ALL {
            for r in 0..GRID_SIZE {
                for c in 0..GRID_SIZE {
                    let cells = (0..len).map(|k| orient.step(r, c, k));
                    let mut n_hits = 0i32;
                    let mut valid = true;
                    for (rr, cc) in cells.clone() {
                        if rr >= GRID_SIZE || cc >= GRID_SIZE || blocked.get(rr, cc).unwrap_or(true)
                        {
                            valid = false;
                            break;
                        }
                        if hits.get(rr, cc).unwrap_or(false) {
                            n_hits += 1;
                        }
                    }
                    if !valid {
                        continue;
                    }
                    let weight = libm::pow(HIT_BIAS, n_hits as f64);
                    for (rr, cc) in cells {
                        if !hits.get(rr, cc).unwrap_or(true) {
                            matrix[rr][cc] += weight;
                        }
                    }
                }
            }
        }
    }

    normalize(matrix, view)
}

fn normalize(mut matrix: Pdf, view: &TheirBoard) -> Pdf {
    let total: f64 = matrix.iter().flatten().sum();
    if total == 0.0 {
        // Nothing fits any more; spread evenly over cells we have not shot.
        let shots = view.shots();
        let open = GRID_SIZE * GRID_SIZE - shots.count_ones();
        let uniform = if open == 0 { 0.0 } else { 1.0 / open as f64 };
        for (r, row) in matrix.iter_mut().enumerate() {
            for (c, v) in row.iter_mut().enumerate() {
                *v = if shots.get(r, c).unwrap_or(true) { 0.0 } else { uniform };
            }
        }
        return matrix;
    }
    for v in matrix.iter_mut().flatten() {
        *v /= total;
    }
    matrix
}

/// Sample an unshot cell from `pdf` using a temperature parameter.
pub fn sample_pdf<R: Rng + ?Sized>(
    pdf: &Pdf,
    view: &TheirBoard,
    temperature: f64,
    rng: &mut R,
) -> Option<(usize, usize)> {
    let mut adjusted = [[0.0f64; GRID_SIZE]; GRID_SIZE];
    let mut total = 0.0;
    for r in 0..GRID_SIZE {
        for c in 0..GRID_SIZE {
            if view.is_shot(r, c).unwrap_or(true) {
                continue;
            }
            let v = libm::pow(pdf[r][c], 1.0 / temperature);
            adjusted[r][c] = v;
            total += v;
        }
    }
    if total > 0.0 {
        let threshold: f64 = rng.random_range(0.0..total);
        let mut cumulative = 0.0;
        let mut last = None;
        for r in 0..GRID_SIZE {
            for c in 0..GRID_SIZE {
                if adjusted[r][c] == 0.0 {
                    continue;
                }
                cumulative += adjusted[r][c];
                last = Some((r, c));
                if threshold < cumulative {
                    return last;
                }
            }
        }
        return last;
    }
    // Degenerate distribution: any open cell will do.
    let open = GRID_SIZE * GRID_SIZE - view.shots_fired();
    if open == 0 {
        return None;
    }
    let pick = rng.random_range(0..open);
    (0..GRID_SIZE)
        .flat_map(|r| (0..GRID_SIZE).map(move |c| (r, c)))
        .filter(|&(r, c)| !view.is_shot(r, c).unwrap_or(true))
        .nth(pick)
}

/// Calculate the PDF and immediately pick a target with it.
pub fn calc_pdf_and_guess<R: Rng + ?Sized>(view: &TheirBoard, rng: &mut R) -> Option<(usize, usize)> {
    let pdf = calc_pdf(view);
    sample_pdf(&pdf, view, TEMPERATURE, rng)
}

/// Background text reader for the sand pit.
///
/// The dug-out (air) cells of the dig region are "ink". Reading works in
/// three passes:
///   1. columns that contain ink form glyph runs, split by empty columns
///   2. each run is cropped to its ink bounding box
///   3. the crop is matched against a 3x5 font at any integer scale
///
/// A run that matches nothing reads as `?`. Runs separated by
/// `SPACE_GAP` or more empty columns get a space between them. An empty
/// result reads as `NO_TEXT`.
///
/// Requests are processed on a worker thread; the game loop polls for
/// results without blocking and keeps only the newest one.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};

use log::{debug, warn};

use crate::domain::tile::TileKind;
use crate::sim::world::NO_TEXT;

/// Empty columns between two runs that count as a word break.
const SPACE_GAP: usize = 3;

const GLYPH_W: usize = 3;
const GLYPH_H: usize = 5;

#[rustfmt::skip]
const FONT: &[(char, [&str; GLYPH_H])] = &[
    ('A', [".#.", "#.#", "###", "#.#", "#.#"]),
    ('B', ["##.", "#.#", "##.", "#.#", "##."]),
    ('C', [".##", "#..", "#..", "#..", ".##"]),
    ('D', ["##.", "#.#", "#.#", "#.#", "##."]),
    ('E', ["###", "#..", "##.", "#..", "###"]),
    ('F', ["###", "#..", "##.", "#..", "#.."]),
    ('G', [".##", "#..", "#.#", "#.#", ".##"]),
    ('H', ["#.#", "#.#", "###", "#.#", "#.#"]),
    ('I', ["###", ".#.", ".#.", ".#.", "###"]),
    ('J', ["..#", "..#", "..#", "#.#", ".#."]),
    ('K', ["#.#", "#.#", "##.", "#.#", "#.#"]),
    ('L', ["#..", "#..", "#..", "#..", "###"]),
    ('M', ["#.#", "###", "###", "#.#", "#.#"]),
    ('N', ["##.", "#.#", "#.#", "#.#", "#.#"]),
    ('O', [".#.", "#.#", "#.#", "#.#", ".#."]),
    ('P', ["##.", "#.#", "##.", "#..", "#.."]),
    ('Q', [".#.", "#.#", "#.#", "##.", ".##"]),
    ('R', ["##.", "#.#", "##.", "#.#", "#.#"]),
    ('S', [".##", "#..", ".#.", "..#", "##."]),
    ('T', ["###", ".#.", ".#.", ".#.", ".#."]),
    ('U', ["#.#", "#.#", "#.#", "#.#", "###"]),
    ('V', ["#.#", "#.#", "#.#", "#.#", ".#."]),
    ('W', ["#.#", "#.#", "###", "###", "#.#"]),
    ('X', ["#.#", "#.#", ".#.", "#.#", "#.#"]),
    ('Y', ["#.#", "#.#", ".#.", ".#.", ".#."]),
    ('Z', ["###", "..#", ".#.", "#..", "###"]),
    ('0', ["###", "#.#", "#.#", "#.#", "###"]),
    ('1', [".#.", "##.", ".#.", ".#.", "###"]),
    ('2', ["##.", "..#", ".#.", "#..", "###"]),
    ('3', ["##.", "..#", ".#.", "..#", "##."]),
    ('4', ["#.#", "#.#", "###", "..#", "..#"]),
    ('5', ["###", "#..", "##.", "..#", "##."]),
    ('6', [".##", "#..", "###", "#.#", "###"]),
    ('7', ["###", "..#", ".#.", ".#.", ".#."]),
    ('8', ["###", "#.#", "###", "#.#", "###"]),
    ('9', ["###", "#.#", "###", "..#", "##."]),
];

type Bitmap = Vec<Vec<bool>>;

// ══════════════════════════════════════════════════════════════
// Recognition
// ══════════════════════════════════════════════════════════════

/// Read the text dug into a rectangular region snapshot (row-major tiles).
pub fn read_text(region: &[Vec<TileKind>]) -> String {
    let ink: Bitmap = region.iter()
        .map(|row| row.iter().map(|&t| t == TileKind::Air).collect())
        .collect();
    let width = ink.first().map_or(0, Vec::len);
    let column_has_ink = |x: usize| ink.iter().any(|row| row.get(x).copied().unwrap_or(false));

    let mut text = String::new();
    let mut x = 0;
    let mut last_run_end: Option<usize> = None;
    while x < width {
        if !column_has_ink(x) {
            x += 1;
            continue;
        }
        let start = x;
        while x < width && column_has_ink(x) {
            x += 1;
        }
        if let Some(end) = last_run_end {
            if start - end >= SPACE_GAP {
                text.push(' ');
            }
        }
        text.push(recognize(&crop(&ink, start, x)));
        last_run_end = Some(x);
    }

    if text.is_empty() {
        NO_TEXT.to_string()
    } else {
        text
    }
}

/// Columns `x0..x1`, cropped vertically to the ink.
fn crop(ink: &Bitmap, x0: usize, x1: usize) -> Bitmap {
    let rows_with_ink: Vec<usize> = (0..ink.len())
        .filter(|&y| ink[y][x0..x1].iter().any(|&c| c))
        .collect();
    match (rows_with_ink.first(), rows_with_ink.last()) {
        (Some(&top), Some(&bottom)) => (top..=bottom).map(|y| ink[y][x0..x1].to_vec()).collect(),
        _ => vec![],
    }
}

fn recognize(bitmap: &Bitmap) -> char {
    FONT.iter()
        .find(|(_, glyph)| matches_glyph(bitmap, glyph))
        .map_or('?', |&(ch, _)| ch)
}

/// Exact match against a glyph drawn at an integer scale.
fn matches_glyph(bitmap: &Bitmap, glyph: &[&str; GLYPH_H]) -> bool {
    let h = bitmap.len();
    let w = bitmap.first().map_or(0, Vec::len);
    if h == 0 || h % GLYPH_H != 0 || w % GLYPH_W != 0 || h / GLYPH_H != w / GLYPH_W {
        return false;
    }
    let scale = h / GLYPH_H;
    bitmap.iter().enumerate().all(|(y, row)| {
        let glyph_row = glyph[y / scale].as_bytes();
        row.iter().enumerate().all(|(x, &ink)| ink == (glyph_row[x / scale] == b'#'))
    })
}

// ══════════════════════════════════════════════════════════════
// Worker
// ══════════════════════════════════════════════════════════════

pub struct TextReader {
    requests: Option<Sender<Vec<Vec<TileKind>>>>,
    results: Receiver<String>,
    worker: Option<JoinHandle<()>>,
}

impl TextReader {
    pub fn spawn() -> Self {
        let (req_tx, req_rx) = channel::<Vec<Vec<TileKind>>>();
        let (res_tx, res_rx) = channel::<String>();
        let worker = thread::spawn(move || {
            for region in req_rx {
                let text = read_text(&region);
                debug!("read '{text}' from dig region");
                if res_tx.send(text).is_err() {
                    break;
                }
            }
        });
        TextReader { requests: Some(req_tx), results: res_rx, worker: Some(worker) }
    }

    /// Queue a region snapshot. Never blocks.
    pub fn request(&self, region: Vec<Vec<TileKind>>) {
        let sent = self.requests.as_ref().map(|tx| tx.send(region).is_ok());
        if sent != Some(true) {
            warn!("text reader is gone, request dropped");
        }
    }

    /// Newest finished result, if any arrived since the last poll.
    pub fn poll(&self) -> Option<String> {
        self.results.try_iter().last()
    }
}

impl Drop for TextReader {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop.
        self.requests.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("text reader thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    /// Sand region with the given rows dug out: '_' is air, anything else sand.
    fn region(rows: &[&str]) -> Vec<Vec<TileKind>> {
        rows.iter()
            .map(|r| r.chars().map(|c| if c == '_' { TileKind::Air } else { TileKind::Sand }).collect())
            .collect()
    }

    #[test]
    fn undug_pit_reads_sentinel() {
        assert_eq!(read_text(&region(&["SSSS", "SSSS"])), NO_TEXT);
        assert_eq!(read_text(&[]), NO_TEXT);
    }

    #[test]
    fn reads_word() {
        let pit = region(&[
            "SSSSSSSSSSS",
            "S_S_S___SSS",
            "S_S_SS_SSSS",
            "S___SS_SSSS",
            "S_S_SS_SSSS",
            "S_S_S___SSS",
            "SSSSSSSSSSS",
        ]);
        assert_eq!(read_text(&pit), "HI");
    }

    #[test]
    fn reads_words_and_digits() {
        let pit = region(&[
            "_S_SSSS__S",
            "_S_SSSSS_S",
            "___SSSS_SS",
            "SS_SSSS_SS",
            "SS_SSSS_SS",
        ]);
        // 4, a gap of four columns, then a 7 with its left column missing.
        assert_eq!(read_text(&pit), "4 ?");
    }

    #[test]
    fn reads_double_size_glyph() {
        let pit = region(&[
            "SS__SS",
            "SS__SS",
            "__SS__",
            "__SS__",
            "______",
            "______",
            "__SS__",
            "__SS__",
            "__SS__",
            "__SS__",
        ]);
        assert_eq!(read_text(&pit), "A");
    }

    #[test]
    fn unknown_shape_reads_question_mark() {
        let pit = region(&["_S", "SS", "SS", "SS"]);
        assert_eq!(read_text(&pit), "?");
    }

    #[test]
    fn font_glyphs_are_unique_and_well_formed() {
        for (i, (a, ga)) in FONT.iter().enumerate() {
            assert!(ga.iter().all(|r| r.len() == GLYPH_W), "{a}");
            for (b, gb) in &FONT[i + 1..] {
                assert_ne!(ga, gb, "{a} and {b} share a glyph");
            }
            // Every glyph reads back as itself.
            let bitmap: Bitmap = ga.iter().map(|r| r.chars().map(|c| c == '#').collect()).collect();
            assert_eq!(recognize(&bitmap), *a);
        }
    }

    #[test]
    fn worker_returns_newest_result() {
        let reader = TextReader::spawn();
        reader.request(region(&["SSS"]));
        reader.request(region(&["_S_", "_S_", "___", "S_S", "S_S"]));
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut latest = None;
        while Instant::now() < deadline {
            if let Some(text) = reader.poll() {
                latest = Some(text);
                if latest.as_deref() != Some(NO_TEXT) {
                    break;
                }
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(latest.as_deref(), Some("?"));
    }
}

//! Extended-XYZ reader.
//!
//! Frames are the usual atom-count / comment / atom-line blocks; the comment
//! line must carry a `Lattice="ax ay az bx by bz cx cy cz"` entry for the
//! cell. Species labels are looked up in the caller's type map and atoms are
//! re-ordered by (species, input order) to match the dump reader's
//! normalization.

use super::{Frame, Frames};

/// Parse a whole extended-XYZ file. Returns a reason string on failure.
pub(crate) fn parse(text: &str, type_map: &[String]) -> Result<Frames, String> {
    let mut lines = text.lines().enumerate().peekable();
    let mut frames: Vec<Frame> = Vec::new();
    let mut atom_types: Option<Vec<usize>> = None;

    while lines.peek().is_some() {
        while matches!(lines.peek(), Some((_, l)) if l.trim().is_empty()) {
            lines.next();
        }
        let Some((no, count_line)) = lines.next() else {
            break;
        };
        let natoms: usize = count_line
            .trim()
            .parse()
            .map_err(|_| format!("line {}: bad atom count {count_line:?}", no + 1))?;

        let (no, comment) = lines
            .next()
            .ok_or_else(|| "unexpected end of file, expected comment line".to_string())?;
        let cell = parse_lattice(comment)
            .ok_or_else(|| format!("line {}: comment line has no Lattice entry", no + 1))?;

        let mut atoms: Vec<(usize, [f64; 3])> = Vec::with_capacity(natoms);
        for _ in 0..natoms {
            let (no, line) = lines
                .next()
                .ok_or_else(|| "unexpected end of file inside a frame".to_string())?;
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 {
                return Err(format!(
                    "line {}: atom line needs species + 3 coordinates",
                    no + 1
                ));
            }
            let species = fields[0];
            let t = type_map
                .iter()
                .position(|s| s == species)
                .ok_or_else(|| {
                    format!("line {}: species {species:?} is not in the type map", no + 1)
                })?;
            let coord = |i: usize| -> Result<f64, String> {
                fields[i]
                    .parse()
                    .map_err(|_| format!("line {}: bad coordinate {:?}", no + 1, fields[i]))
            };
            atoms.push((t, [coord(1)?, coord(2)?, coord(3)?]));
        }

        // Stable sort keeps input order within a species.
        atoms.sort_by_key(|&(t, _)| t);
        let types: Vec<usize> = atoms.iter().map(|&(t, _)| t).collect();
        let coords: Vec<[f64; 3]> = atoms.iter().map(|&(_, c)| c).collect();

        match &atom_types {
            None => atom_types = Some(types),
            Some(first) if *first != types => {
                return Err(format!(
                    "frame {} changes atomic composition within the trajectory",
                    frames.len()
                ));
            }
            Some(_) => {}
        }

        frames.push(Frame { cell, coords });
    }

    Frames::new(
        type_map.to_vec(),
        atom_types.unwrap_or_default(),
        frames,
    )
    .map_err(|e| e.to_string())
}

/// Extract the 3x3 cell from a `Lattice="..."` entry, if present.
fn parse_lattice(comment: &str) -> Option<[[f64; 3]; 3]> {
    let start = comment.find("Lattice=\"")? + "Lattice=\"".len();
    let end = comment[start..].find('"')? + start;
    let vals: Vec<f64> = comment[start..end]
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    if vals.len() != 9 {
        return None;
    }
    Some([
        [vals[0], vals[1], vals[2]],
        [vals[3], vals[4], vals[5]],
        [vals[6], vals[7], vals[8]],
    ])
}

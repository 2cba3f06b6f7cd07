//! LAMMPS text-dump reader.
//!
//! Parses the `ITEM:`-sectioned dump format, orthogonal or triclinic boxes,
//! and `id`/`type`/`x y z` atom columns. Numeric atom types are 1-based
//! indices into the caller's type map. Atoms are re-ordered by (species,
//! atom id) so that every frame of a trajectory shares one normalized atom
//! order.

use super::{Frame, Frames};

/// Parse a whole dump file. Returns a reason string on failure.
pub(crate) fn parse(text: &str, type_map: &[String]) -> Result<Frames, String> {
    let mut lines = text.lines().enumerate().peekable();
    let mut frames: Vec<Frame> = Vec::new();
    let mut atom_types: Option<Vec<usize>> = None;

    while lines.peek().is_some() {
        // Skip blank lines between frames.
        while matches!(lines.peek(), Some((_, l)) if l.trim().is_empty()) {
            lines.next();
        }
        if lines.peek().is_none() {
            break;
        }

        expect_item(&mut lines, "TIMESTEP")?;
        let (_, _timestep) = next_content(&mut lines, "timestep value")?;

        expect_item(&mut lines, "NUMBER OF ATOMS")?;
        let (no, natoms_line) = next_content(&mut lines, "atom count")?;
        let natoms: usize = natoms_line
            .trim()
            .parse()
            .map_err(|_| format!("line {}: bad atom count {natoms_line:?}", no + 1))?;

        let bounds_header = expect_item(&mut lines, "BOX BOUNDS")?;
        let triclinic = bounds_header.contains("xy xz yz");
        let mut bounds = [[0.0f64; 3]; 3];
        for row in bounds.iter_mut() {
            let (no, line) = next_content(&mut lines, "box bounds row")?;
            let vals = parse_floats(line)
                .map_err(|tok| format!("line {}: bad box bound {tok:?}", no + 1))?;
            let want = if triclinic { 3 } else { 2 };
            if vals.len() != want {
                return Err(format!(
                    "line {}: expected {want} box-bound fields, found {}",
                    no + 1,
                    vals.len()
                ));
            }
            row[..vals.len()].copy_from_slice(&vals);
        }
        let cell = cell_from_bounds(&bounds, triclinic);

        let atoms_header = expect_item(&mut lines, "ATOMS")?;
        let cols: Vec<&str> = atoms_header.split_whitespace().collect();
        let col = |name: &str| {
            cols.iter()
                .position(|c| *c == name)
                .ok_or_else(|| format!("dump is missing atom column {name:?}"))
        };
        let (c_id, c_type) = (col("id")?, col("type")?);
        let (c_x, c_y, c_z) = (col("x")?, col("y")?, col("z")?);

        let mut atoms: Vec<(i64, usize, [f64; 3])> = Vec::with_capacity(natoms);
        for _ in 0..natoms {
            let (no, line) = next_content(&mut lines, "atom row")?;
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < cols.len() {
                return Err(format!(
                    "line {}: atom row has {} fields, header names {}",
                    no + 1,
                    fields.len(),
                    cols.len()
                ));
            }
            let id: i64 = fields[c_id]
                .parse()
                .map_err(|_| format!("line {}: bad atom id {:?}", no + 1, fields[c_id]))?;
            let raw_type: usize = fields[c_type]
                .parse()
                .map_err(|_| format!("line {}: bad atom type {:?}", no + 1, fields[c_type]))?;
            if raw_type == 0 || raw_type > type_map.len() {
                return Err(format!(
                    "line {}: atom type {raw_type} outside the {}-entry type map",
                    no + 1,
                    type_map.len()
                ));
            }
            let pos = |c: usize| -> Result<f64, String> {
                fields[c]
                    .parse()
                    .map_err(|_| format!("line {}: bad coordinate {:?}", no + 1, fields[c]))
            };
            atoms.push((id, raw_type - 1, [pos(c_x)?, pos(c_y)?, pos(c_z)?]));
        }

        // Normalize atom order: species first, then atom id.
        atoms.sort_by_key(|&(id, t, _)| (t, id));
        let types: Vec<usize> = atoms.iter().map(|&(_, t, _)| t).collect();
        let coords: Vec<[f64; 3]> = atoms.iter().map(|&(_, _, c)| c).collect();

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

/// Consume the next line, requiring an `ITEM: <tag>` header; returns the
/// remainder of the header line after the tag.
fn expect_item<'a, I>(lines: &mut I, tag: &str) -> Result<String, String>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    let (no, line) = lines
        .next()
        .ok_or_else(|| format!("unexpected end of dump, expected ITEM: {tag}"))?;
    let line = line.trim();
    let rest = line
        .strip_prefix("ITEM:")
        .map(str::trim)
        .and_then(|r| r.strip_prefix(tag))
        .ok_or_else(|| format!("line {}: expected ITEM: {tag}, found {line:?}", no + 1))?;
    Ok(rest.trim().to_string())
}

fn next_content<'a, I>(lines: &mut I, what: &str) -> Result<(usize, &'a str), String>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    lines
        .next()
        .ok_or_else(|| format!("unexpected end of dump, expected {what}"))
}

fn parse_floats(line: &str) -> Result<Vec<f64>, String> {
    line.split_whitespace()
        .map(|tok| tok.parse::<f64>().map_err(|_| tok.to_string()))
        .collect()
}

/// Convert dump box bounds into a row-major cell matrix.
///
/// Triclinic bounds carry the tilt factors in the third column and widen the
/// stored lo/hi values; undo that per the dump convention before building
/// the lattice vectors.
fn cell_from_bounds(bounds: &[[f64; 3]; 3], triclinic: bool) -> [[f64; 3]; 3] {
    if !triclinic {
        let dx = bounds[0][1] - bounds[0][0];
        let dy = bounds[1][1] - bounds[1][0];
        let dz = bounds[2][1] - bounds[2][0];
        return [[dx, 0.0, 0.0], [0.0, dy, 0.0], [0.0, 0.0, dz]];
    }
    let (xy, xz, yz) = (bounds[0][2], bounds[1][2], bounds[2][2]);
    let xlo = bounds[0][0] - [0.0, xy, xz, xy + xz].iter().cloned().fold(f64::INFINITY, f64::min);
    let xhi = bounds[0][1] - [0.0, xy, xz, xy + xz].iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let ylo = bounds[1][0] - yz.min(0.0);
    let yhi = bounds[1][1] - yz.max(0.0);
    let (zlo, zhi) = (bounds[2][0], bounds[2][1]);
    [
        [xhi - xlo, 0.0, 0.0],
        [xy, yhi - ylo, 0.0],
        [xz, yz, zhi - zlo],
    ]
}

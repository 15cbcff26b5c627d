use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::assembler::Assembler;
use crate::error::{Error, Result};
use crate::memory::{PROGRAM_LEN, PROGRAM_START};

/// Exclusive upper bound on a storable program word.
pub const PROGRAM_WORD_LIMIT: u16 = 9999;

const BYTES_LEN: usize = PROGRAM_LEN * 2;

/// A saved program image: the cells at addresses 50..=99 in order.
///
/// Every value lies in `[0, 9999)`; construction rejects anything else
/// instead of truncating it. Equality is element-wise. Serializes as a
/// plain 50-element array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u16>", into = "Vec<u16>")]
pub struct ProgramData([u16; PROGRAM_LEN]);

fn check(address: usize, value: i32) -> Result<u16> {
    if (0..i32::from(PROGRAM_WORD_LIMIT)).contains(&value) {
        Ok(value as u16)
    } else {
        Err(Error::ValueOutOfRange { address, value })
    }
}

impl ProgramData {
    pub fn new(values: [u16; PROGRAM_LEN]) -> Result<Self> {
        for (i, &v) in values.iter().enumerate() {
            check(PROGRAM_START + i, i32::from(v))?;
        }
        Ok(Self(values))
    }

    /// Pack the program region of a memory image.
    pub fn from_cells(cells: &[i32]) -> Result<Self> {
        if cells.len() != PROGRAM_LEN {
            return Err(Error::WrongLength {
                expected: PROGRAM_LEN,
                found: cells.len(),
            });
        }
        let mut values = [0u16; PROGRAM_LEN];
        for (i, &v) in cells.iter().enumerate() {
            values[i] = check(PROGRAM_START + i, v)?;
        }
        Ok(Self(values))
    }

    pub fn values(&self) -> &[u16; PROGRAM_LEN] {
        &self.0
    }

    pub fn to_cells(&self) -> [i32; PROGRAM_LEN] {
        self.0.map(i32::from)
    }

    /// Binary form: one big-endian `u16` per cell, 100 bytes in total.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.iter().flat_map(|v| v.to_be_bytes()).collect()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != BYTES_LEN {
            return Err(Error::WrongLength {
                expected: BYTES_LEN,
                found: bytes.len(),
            });
        }
        let mut values = [0u16; PROGRAM_LEN];
        for (i, pair) in bytes.chunks_exact(2).enumerate() {
            values[i] = u16::from_be_bytes([pair[0], pair[1]]);
        }
        Self::new(values)
    }

    /// Assemble a program and pad the rest of the region with halts.
    pub fn from_assembler(program: &Assembler) -> Result<Self> {
        let words = program.finish()?;
        let mut cells = [0i32; PROGRAM_LEN];
        cells[..words.len()].copy_from_slice(&words);
        Self::from_cells(&cells)
    }

    /// Parse a stored image: a JSON array if it starts with `[`, the text
    /// form otherwise.
    pub fn parse_image(text: &str) -> Result<Self> {
        if text.trim_start().starts_with('[') {
            Ok(serde_json::from_str(text)?)
        } else {
            text.parse()
        }
    }

    /// A random program. Each cell is a halt with probability 1/8,
    /// otherwise a random move.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let mut values = [0u16; PROGRAM_LEN];
        for v in values.iter_mut() {
            if rng.gen_range(0..8) != 0 {
                *v = rng.gen_range(1..PROGRAM_WORD_LIMIT);
            }
        }
        Self(values)
    }
}

impl Default for ProgramData {
    fn default() -> Self {
        Self([0; PROGRAM_LEN])
    }
}

impl TryFrom<Vec<u16>> for ProgramData {
    type Error = Error;

    fn try_from(values: Vec<u16>) -> Result<Self> {
        let found = values.len();
        let values: [u16; PROGRAM_LEN] = values.try_into().map_err(|_| Error::WrongLength {
            expected: PROGRAM_LEN,
            found,
        })?;
        Self::new(values)
    }
}

impl From<ProgramData> for Vec<u16> {
    fn from(data: ProgramData) -> Self {
        data.0.to_vec()
    }
}

/// Text form: ten zero-padded values per line.
impl fmt::Display for ProgramData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.0.chunks(10) {
            let line: Vec<String> = row.iter().map(|v| format!("{v:04}")).collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}

impl FromStr for ProgramData {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut values = Vec::with_capacity(PROGRAM_LEN);
        for (idx, line) in s.lines().enumerate() {
            for token in line.split_whitespace() {
                let v = token.parse::<u16>().map_err(|e| Error::Parse {
                    line: idx + 1,
                    message: format!("invalid value '{token}': {e}"),
                })?;
                values.push(v);
            }
        }
        Self::try_from(values)
    }
}

//! Shadow-map codec and bitwise algebra.
//!
//! A shadow map carries one bit per matcher-table byte, `1` meaning the byte
//! was never executed. On disk the bits are packed most-significant first
//! within each byte, the trailing byte zero-padded; the format matches the
//! instrumentation runtime, so existing corpora stay readable.

use crate::error::{MapearError, MapearResult};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

/// Read a packed bit vector of exactly `bit_size` bits.
///
/// Padding bits past `bit_size` are discarded; extra trailing bytes are
/// tolerated. A file holding fewer than `bit_size` bits is fatal.
///
/// # Errors
///
/// [`MapearError::Io`] on read failure, [`MapearError::ShadowMapSize`] on a
/// short file.
pub fn read_bit_vector(bit_size: usize, path: impl AsRef<Path>) -> MapearResult<Vec<bool>> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|source| MapearError::io(path, source))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|source| MapearError::io(path, source))?;

    let mut bits = Vec::with_capacity(bit_size);
    'outer: for byte in bytes {
        for offset in 0..8 {
            if bits.len() == bit_size {
                break 'outer;
            }
            bits.push((byte >> (7 - offset)) & 1 != 0);
        }
    }
    if bits.len() != bit_size {
        return Err(MapearError::ShadowMapSize {
            path: path.to_path_buf(),
            expected: bit_size,
            actual: bits.len(),
        });
    }
    Ok(bits)
}

/// Read several packed bit vectors of the same size
///
/// # Errors
///
/// First failure of [`read_bit_vector`] wins.
pub fn read_bit_vectors(
    bit_size: usize,
    paths: &[impl AsRef<Path>],
) -> MapearResult<Vec<Vec<bool>>> {
    paths
        .iter()
        .map(|path| read_bit_vector(bit_size, path))
        .collect()
}

/// Write a bit vector in the packed format, zero-padding the last byte
///
/// # Errors
///
/// [`MapearError::Io`] on any write failure.
pub fn write_bit_vector(bits: &[bool], path: impl AsRef<Path>) -> MapearResult<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| MapearError::io(path, source))?;
    let mut writer = BufWriter::new(file);
    for chunk in bits.chunks(8) {
        let mut byte = 0u8;
        for (offset, &bit) in chunk.iter().enumerate() {
            if bit {
                byte |= 1 << (7 - offset);
            }
        }
        writer
            .write_all(&[byte])
            .map_err(|source| MapearError::io(path, source))?;
    }
    writer
        .flush()
        .map_err(|source| MapearError::io(path, source))
}

/// Fold an elementwise boolean op across maps: the first map seeds the
/// result, every further map combines into it. Empty input yields an empty
/// map.
#[must_use]
pub fn do_map_op<F>(maps: &[Vec<bool>], op: F) -> Vec<bool>
where
    F: Fn(bool, bool) -> bool,
{
    let Some((first, rest)) = maps.split_first() else {
        return Vec::new();
    };
    let mut result = first.clone();
    for map in rest {
        for (r, &m) in result.iter_mut().zip(map) {
            *r = op(*r, m);
        }
    }
    result
}

/// Union of coverage: a byte counts as covered when any input covered it.
/// On uncovered bits that is `and`.
#[must_use]
pub fn map_union(maps: &[Vec<bool>]) -> Vec<bool> {
    do_map_op(maps, |r, m| r & m)
}

/// Intersection of coverage: a byte counts as covered only when every input
/// covered it. On uncovered bits that is `or`.
#[must_use]
pub fn map_intersect(maps: &[Vec<bool>]) -> Vec<bool> {
    do_map_op(maps, |r, m| r | m)
}

/// Coverage difference: a result bit is set where the first map left the
/// byte uncovered but a later map covered it, i.e. the coverage the later
/// maps add over the first.
#[must_use]
pub fn map_diff(maps: &[Vec<bool>]) -> Vec<bool> {
    do_map_op(maps, |r, m| r & !m)
}

/// Number of covered table bytes (zero bits) in a map
#[must_use]
pub fn covered_count(map: &[bool]) -> usize {
    map.iter().filter(|&&bit| !bit).count()
}


#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    fn map_strategy(max_bits: usize) -> impl Strategy<Value = Vec<bool>> {
        proptest::collection::vec(any::<bool>(), 0..max_bits)
    }

    proptest! {
        /// Writing then reading any bit vector reproduces it exactly
        #[test]
        fn prop_round_trip(map in map_strategy(256)) {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("map.bin");
            write_bit_vector(&map, &path).unwrap();
            let read = read_bit_vector(map.len(), &path).unwrap();
            prop_assert_eq!(read, map);
        }

        /// The file is always exactly ceil(len / 8) bytes
        #[test]
        fn prop_written_size(map in map_strategy(256)) {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("map.bin");
            write_bit_vector(&map, &path).unwrap();
            let bytes = std::fs::read(&path).unwrap();
            prop_assert_eq!(bytes.len(), map.len().div_ceil(8));
        }

        /// Union and intersection are idempotent; diff of a map with
        /// itself covers everything
        #[test]
        fn prop_map_op_laws(map in map_strategy(128)) {
            let pair = vec![map.clone(), map.clone()];
            prop_assert_eq!(map_union(&pair), map.clone());
            prop_assert_eq!(map_intersect(&pair), map.clone());
            prop_assert!(map_diff(&pair).iter().all(|&bit| !bit));
        }

        /// Union never uncovers a byte either input covered; intersection
        /// never covers a byte either input missed
        #[test]
        fn prop_union_intersect_bounds(
            m1 in map_strategy(128),
            m2 in map_strategy(128)
        ) {
            let len = m1.len().min(m2.len());
            let a: Vec<bool> = m1[..len].to_vec();
            let b: Vec<bool> = m2[..len].to_vec();
            let union = map_union(&[a.clone(), b.clone()]);
            let inter = map_intersect(&[a.clone(), b.clone()]);
            for i in 0..len {
                prop_assert_eq!(union[i], a[i] && b[i]);
                prop_assert_eq!(inter[i], a[i] || b[i]);
            }
        }
    }
}

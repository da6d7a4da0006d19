//! Hierarchical on-disk layout built from directories of `.npy` files.
//!
//! Each computable object owns a root directory holding its scalar data, with
//! a `parts` subdirectory that holds one directory per block, named by the
//! stringified block number.

use std::{ fs, path::{ Path, PathBuf } };
use ndarray as nd;
use ndarray_npy::{ ReadNpyExt, ReadableElement, WritableElement, read_npy, write_npy };
use crate::{
    error::{ EdError, EdResult },
    fock::BlockNumber,
};

/// Name of the per-block subdirectory.
pub const PARTS: &str = "parts";

/// Create a directory and all its parents if it does not already exist.
pub fn mkdir(path: &Path) -> EdResult<()> {
    fs::create_dir_all(path)?;
    Ok(())
}

/// Return the directory holding the data for block `n`.
pub fn part_dir(root: &Path, n: BlockNumber) -> PathBuf {
    root.join(PARTS).join(n.to_string())
}

/// Count the per-block directories stored under `root`.
pub fn count_parts(root: &Path) -> EdResult<usize> {
    let mut count: usize = 0;
    for entry in fs::read_dir(root.join(PARTS))? {
        if entry?.file_type()?.is_dir() { count += 1; }
    }
    Ok(count)
}

/// Write an array to `<dir>/<name>.npy`.
pub fn write_array<A, D>(dir: &Path, name: &str, array: &nd::Array<A, D>)
    -> EdResult<()>
where
    A: WritableElement,
    D: nd::Dimension,
{
    let path = dir.join(format!("{name}.npy"));
    write_npy(&path, array)
        .map_err(|source| EdError::WriteNpy { path, source })
}

/// Read an array from `<dir>/<name>.npy`.
pub fn read_array<A, D>(dir: &Path, name: &str) -> EdResult<nd::Array<A, D>>
where
    A: ReadableElement,
    D: nd::Dimension,
    nd::Array<A, D>: ReadNpyExt,
{
    let path = dir.join(format!("{name}.npy"));
    read_npy(&path)
        .map_err(|source| EdError::ReadNpy { path, source })
}

/// Write a single real number to `<dir>/<name>.npy`.
pub fn write_scalar(dir: &Path, name: &str, x: f64) -> EdResult<()> {
    write_array(dir, name, &nd::arr0(x))
}

/// Read a single real number from `<dir>/<name>.npy`.
pub fn read_scalar(dir: &Path, name: &str) -> EdResult<f64> {
    read_array::<f64, nd::Ix0>(dir, name).map(|x| x.into_scalar())
}

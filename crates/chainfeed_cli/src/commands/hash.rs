//! `hash` and `prev-hash` commands.

use chainfeed_codec::read_prev_hash;
use chainfeed_core::hash_stream;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Prints the content hash of a record file.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let name = path.display().to_string();
    let hash = hash_stream(&name, File::open(path)?)?;
    println!("{hash}");
    Ok(())
}

/// Prints the previous-file hash a record file declares.
pub fn run_prev(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let name = path.display().to_string();
    match read_prev_hash(&name, BufReader::new(File::open(path)?))? {
        Some(hash) => println!("{hash}"),
        None => return Err(format!("{name} does not start with a previous hash").into()),
    }
    Ok(())
}

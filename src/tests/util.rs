use std::{
	io,
	fs::{self, File},
	path::{Path, PathBuf},
};


/// The extension of source files.
const SOURCE_EXTENSION: &str = "co";


/// Run the test over every source file below the directory, relative to the crate root.
/// Files are visited in path order, so that failures are reproducible.
pub fn test_dir<P, F>(path: P, mut test: F) -> io::Result<()>
where
	P: AsRef<Path>,
	F: FnMut(&Path, File) -> io::Result<()>,
{
	let root = Path::new(env!("CARGO_MANIFEST_DIR")).join(path);

	let mut pending = vec![root];
	let mut sources = Vec::new();

	while let Some(dir) = pending.pop() {
		for entry in fs::read_dir(&dir)? {
			let path = entry?.path();

			if path.is_dir() {
				pending.push(path);
			} else if path.extension().map_or(false, |ext| ext == SOURCE_EXTENSION) {
				sources.push(path);
			}
		}
	}

	sources.sort();

	for path in sources {
		let file = File::open(&path)?;
		test(&path, file)?;
	}

	Ok(())
}


/// The path of a test data file, relative to the crate root.
pub fn data_path<P: AsRef<Path>>(path: P) -> PathBuf {
	Path::new(env!("CARGO_MANIFEST_DIR")).join(path)
}

//! Input discovery and image file I/O.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use equalizer::{Image, PixelLayout};
use tracing::{debug, warn};
use walkdir::WalkDir;

const SUPPORTED_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "bmp", "gif", "tif", "tiff", "tga", "webp", "ppm", "pnm",
];

/// Suffix added to the file stem of every output.
pub const OUTPUT_SUFFIX: &str = "_equalized";

pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| supported.eq_ignore_ascii_case(ext))
        })
}

/// Expand the given paths into a sorted, de-duplicated list of image files.
///
/// Files are taken as given; directories are walked recursively and filtered
/// by extension. Previous outputs are skipped so re-runs do not feed on
/// themselves.
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();

    for path in paths {
        if path.is_file() {
            inputs.push(path.clone());
        } else if path.is_dir() {
            for entry in WalkDir::new(path).follow_links(true) {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!(error = %e, "Skipping unreadable directory entry");
                        continue;
                    }
                };
                let candidate = entry.path();
                if entry.file_type().is_file()
                    && is_supported_image(candidate)
                    && !is_previous_output(candidate)
                {
                    inputs.push(candidate.to_path_buf());
                }
            }
        } else {
            bail!("Input path does not exist: {}", path.display());
        }
    }

    inputs.sort();
    inputs.dedup();
    debug!(count = inputs.len(), "Collected input images");
    Ok(inputs)
}

fn is_previous_output(path: &Path) -> bool {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map_or(false, |stem| stem.ends_with(OUTPUT_SUFFIX))
}

/// Where the equalized version of `input` is written.
pub fn output_path(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let file_name = format!("{}{}.png", stem, OUTPUT_SUFFIX);

    match output_dir {
        Some(dir) => dir.join(file_name),
        None => input.with_file_name(file_name),
    }
}

/// Decode an image file. Images with an alpha channel keep it as `Rgba8`,
/// everything else is converted to `Rgb8`.
pub fn load_image(path: &Path) -> Result<Image> {
    let decoded = image::open(path)
        .with_context(|| format!("Failed to decode image: {}", path.display()))?;

    let image = if decoded.color().has_alpha() {
        let buffer = decoded.to_rgba8();
        let (width, height) = buffer.dimensions();
        Image::from_raw(width, height, PixelLayout::Rgba8, buffer.into_raw())?
    } else {
        let buffer = decoded.to_rgb8();
        let (width, height) = buffer.dimensions();
        Image::from_raw(width, height, PixelLayout::Rgb8, buffer.into_raw())?
    };
    Ok(image)
}

pub fn save_png(path: &Path, image: &Image) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    let color = match image.layout() {
        PixelLayout::Rgb8 => image::ColorType::Rgb8,
        PixelLayout::Rgba8 => image::ColorType::Rgba8,
    };
    image::save_buffer_with_format(
        path,
        image.as_bytes(),
        image.width(),
        image.height(),
        color,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("Failed to write PNG: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported_image(Path::new("a/b/photo.PNG")));
        assert!(is_supported_image(Path::new("photo.jpeg")));
        assert!(!is_supported_image(Path::new("notes.txt")));
        assert!(!is_supported_image(Path::new("no_extension")));
    }

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path(Path::new("in/photo.jpg"), None),
            PathBuf::from("in/photo_equalized.png")
        );
        assert_eq!(
            output_path(Path::new("in/photo.jpg"), Some(Path::new("out"))),
            PathBuf::from("out/photo_equalized.png")
        );
    }

    #[test]
    fn test_collect_inputs_walks_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("b.png"), b"").unwrap();
        fs::write(nested.join("a.JPG"), b"").unwrap();
        fs::write(dir.path().join("readme.md"), b"").unwrap();
        fs::write(dir.path().join("b_equalized.png"), b"").unwrap();

        let inputs = collect_inputs(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(inputs, vec![dir.path().join("b.png"), nested.join("a.JPG")]);
    }

    #[test]
    fn test_collect_inputs_explicit_file_and_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("x.png");
        fs::write(&file, b"").unwrap();

        let inputs = collect_inputs(&[file.clone(), dir.path().to_path_buf()]).unwrap();
        assert_eq!(inputs, vec![file]);
    }

    #[test]
    fn test_collect_inputs_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect_inputs(&[dir.path().join("missing")]).is_err());
    }

    #[test]
    fn test_png_round_trip_keeps_layout() {
        let dir = tempfile::tempdir().unwrap();
        for image in [test_utils::noise_image(9, 5, 1), test_utils::noise_rgba_image(9, 5, 2)] {
            let path = dir.path().join(format!("{:?}.png", image.layout()));
            save_png(&path, &image).unwrap();
            let loaded = load_image(&path).unwrap();
            assert_eq!(loaded, image);
        }
    }

    #[test]
    fn test_load_garbage_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        fs::write(&path, b"definitely not a png").unwrap();
        assert!(load_image(&path).is_err());
    }
}

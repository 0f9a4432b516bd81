//! 读取待检测的帧：单张图片 = 第 0 帧；视频 = 抽帧目录，按文件名排序编号

use std::fs;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use log::{debug, info};

use super::{DetectorError, DetectorSource};

const FRAME_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// 已解码的一帧
#[derive(Debug, Clone)]
pub struct SampledFrame {
    pub frame: u64,
    pub image: DynamicImage,
}

pub fn load_frames(source: &DetectorSource) -> Result<Vec<SampledFrame>, DetectorError> {
    match source {
        DetectorSource::Image(path) => {
            let image = image::open(path)?;
            Ok(vec![SampledFrame { frame: 0, image }])
        }
        DetectorSource::Video(path) => {
            let paths = frame_paths(path)?;
            info!("🎬 Loading {} sampled frames from {:?}", paths.len(), path);

            paths
                .into_iter()
                .enumerate()
                .map(|(index, frame_path)| -> Result<SampledFrame, DetectorError> {
                    let image = image::open(&frame_path)?;
                    Ok(SampledFrame {
                        frame: index as u64,
                        image,
                    })
                })
                .collect()
        }
    }
}

/// 列出抽帧目录中的图片文件（按文件名排序）
pub fn frame_paths(dir: &Path) -> Result<Vec<PathBuf>, DetectorError> {
    if !dir.is_dir() {
        return Err(DetectorError::UnsupportedSource(format!(
            "{:?} is not a directory of sampled frames; decode the video into frame images first",
            dir
        )));
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_frame_image(p))
        .collect();
    paths.sort();

    debug!("Found {} frame images in {:?}", paths.len(), dir);
    Ok(paths)
}

fn is_frame_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, RgbImage};

    fn write_png(path: &Path, width: u32, height: u32) {
        RgbImage::new(width, height).save(path).unwrap();
    }

    #[test]
    fn test_single_image_is_frame_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hand.png");
        write_png(&path, 8, 6);

        let frames = load_frames(&DetectorSource::Image(path)).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].frame, 0);
        assert_eq!(frames[0].image.width(), 8);
    }

    #[test]
    fn test_video_directory_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("frame_0002.png"), 2, 2);
        write_png(&dir.path().join("frame_0000.png"), 4, 4);
        write_png(&dir.path().join("frame_0001.png"), 3, 3);
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let frames = load_frames(&DetectorSource::Video(dir.path().to_path_buf())).unwrap();
        let widths: Vec<u32> = frames.iter().map(|f| f.image.width()).collect();
        let indices: Vec<u64> = frames.iter().map(|f| f.frame).collect();

        assert_eq!(widths, vec![4, 3, 2]);
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_video_container_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        fs::write(&path, b"not really a video").unwrap();

        let err = load_frames(&DetectorSource::Video(path)).unwrap_err();
        assert!(matches!(err, DetectorError::UnsupportedSource(_)));
    }

    #[test]
    fn test_missing_image() {
        let err = load_frames(&DetectorSource::Image(PathBuf::from("/nonexistent/x.png"))).unwrap_err();
        assert!(matches!(err, DetectorError::Image(_) | DetectorError::Io(_)));
    }
}

//! Image buffer conversions between OpenCV and the `image` crate
//!
//! OpenCV frames in this crate are always 8-bit BGR; `image` buffers are RGB.

use crate::Result;
use crate::error::DetectionError;
use anyhow::{Context, anyhow};
use opencv::{
    core::{CV_8UC3, Mat, Scalar},
    imgcodecs::{self, IMREAD_COLOR},
    prelude::*,
};
use std::path::Path;

/// Image utility functions
pub struct ImageUtils;

impl ImageUtils {
    /// Fail unless `mat` is a non-empty 8-bit, 3-channel image
    pub fn ensure_8uc3(mat: &Mat) -> Result<()> {
        if mat.empty() {
            return Err(DetectionError::EmptyFrame.into());
        }
        if mat.typ() != CV_8UC3 {
            return Err(DetectionError::UnsupportedFrame {
                typ: mat.typ(),
                channels: mat.channels(),
            }
            .into());
        }
        Ok(())
    }

    /// Wrap a packed, row-major BGR buffer in a new Mat
    pub fn bgr_mat_from_raw(width: i32, height: i32, data: &[u8]) -> Result<Mat> {
        let expected = width.max(0) as usize * height.max(0) as usize * 3;
        if data.len() != expected || expected == 0 {
            return Err(DetectionError::BufferSize {
                width,
                height,
                expected,
                actual: data.len(),
            }
            .into());
        }

        let mut mat = Mat::new_rows_cols_with_default(height, width, CV_8UC3, Scalar::all(0.0))?;
        mat.data_bytes_mut()?.copy_from_slice(data);
        Ok(mat)
    }

    /// Convert image::RgbImage to a BGR Mat
    pub fn rgb_to_mat(rgb_image: &image::RgbImage) -> Result<Mat> {
        let (width, height) = rgb_image.dimensions();
        let bgr: Vec<u8> = rgb_image
            .as_raw()
            .chunks_exact(3)
            .flat_map(|px| [px[2], px[1], px[0]])
            .collect();

        Self::bgr_mat_from_raw(width as i32, height as i32, &bgr)
            .context("Failed to convert RGB image to OpenCV Mat")
    }

    /// Convert a BGR Mat to image::RgbImage
    pub fn mat_to_rgb(mat: &Mat) -> Result<image::RgbImage> {
        Self::ensure_8uc3(mat)?;

        let continuous;
        let source = if mat.is_continuous() {
            mat
        } else {
            continuous = mat.try_clone()?;
            &continuous
        };

        let rgb: Vec<u8> = source
            .data_bytes()?
            .chunks_exact(3)
            .flat_map(|px| [px[2], px[1], px[0]])
            .collect();

        image::RgbImage::from_raw(mat.cols() as u32, mat.rows() as u32, rgb)
            .ok_or_else(|| anyhow!("Failed to convert OpenCV Mat to RGB image"))
    }

    /// Load image as BGR Mat, decoding with the `image` crate and falling
    /// back to OpenCV for formats it does not handle
    pub fn load_color<P: AsRef<Path>>(path: P) -> Result<Mat> {
        match image::open(&path) {
            Ok(img) => Self::rgb_to_mat(&img.to_rgb8()),
            Err(err) => {
                log::debug!(
                    "image crate could not open {:?} ({}), trying OpenCV",
                    path.as_ref(),
                    err
                );
                Self::load_mat_color(&path)
            }
        }
    }

    /// Load image directly from path as OpenCV Mat (color)
    pub fn load_mat_color<P: AsRef<Path>>(path: P) -> Result<Mat> {
        let path_str = path.as_ref().to_string_lossy();

        let mat = imgcodecs::imread(&path_str, IMREAD_COLOR)
            .with_context(|| format!("Failed to load color image: {}", path_str))?;
        if mat.empty() {
            return Err(anyhow!("Failed to decode image: {}", path_str));
        }
        Ok(mat)
    }

    /// Save a BGR Mat; the format follows the file extension
    pub fn save_image<P: AsRef<Path>>(mat: &Mat, path: P) -> Result<()> {
        let rgb_image = Self::mat_to_rgb(mat)?;
        rgb_image
            .save(&path)
            .with_context(|| format!("Failed to save image: {:?}", path.as_ref()))?;
        Ok(())
    }
}

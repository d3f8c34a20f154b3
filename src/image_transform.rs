use candle_core::{Device, Tensor};
use image::RgbImage;
use ndarray::{Array3, Axis};

use crate::Result;

/// Image as stored in a sample: raw RGB unless a transform turned it into a tensor.
#[derive(Debug, Clone)]
pub enum SampleImage {
    Rgb(RgbImage),
    Tensor(Tensor),
}

impl SampleImage {
    pub fn as_tensor(&self) -> Option<&Tensor> {
        match self {
            SampleImage::Tensor(t) => Some(t),
            SampleImage::Rgb(_) => None,
        }
    }

    pub fn as_rgb(&self) -> Option<&RgbImage> {
        match self {
            SampleImage::Rgb(im) => Some(im),
            SampleImage::Tensor(_) => None,
        }
    }
}

pub trait ImageTransform: Send + Sync {
    fn transform(&self, image: RgbImage) -> Result<Tensor>;
}

impl<F> ImageTransform for F
where
    F: Fn(RgbImage) -> Result<Tensor> + Send + Sync,
{
    fn transform(&self, image: RgbImage) -> Result<Tensor> {
        self(image)
    }
}

/// Converts to a `(3, H, W)` f32 tensor in `[0, 1]`, then applies
/// `(x - mean) / std` per channel.
#[derive(Debug, Clone)]
pub struct ToTensorNormalize {
    pub mean: [f32; 3],
    pub std: [f32; 3],
    pub device: Device,
}

impl Default for ToTensorNormalize {
    /// Maps channel values to `[-1, 1]`.
    fn default() -> Self {
        Self {
            mean: [0.5, 0.5, 0.5],
            std: [0.5, 0.5, 0.5],
            device: Device::Cpu,
        }
    }
}

impl ToTensorNormalize {
    pub fn to_array(&self, image: RgbImage) -> Result<Array3<f32>> {
        let (w, h) = image.dimensions();
        let hwc = Array3::from_shape_vec((h as usize, w as usize, 3), image.into_raw())?;
        let mut chw = hwc.permuted_axes([2, 0, 1]).mapv(|x| x as f32 / 255.0);
        for (c, mut channel) in chw.axis_iter_mut(Axis(0)).enumerate() {
            let (mean, std) = (self.mean[c], self.std[c]);
            channel.mapv_inplace(|x| (x - mean) / std);
        }
        Ok(chw)
    }
}

impl ImageTransform for ToTensorNormalize {
    fn transform(&self, image: RgbImage) -> Result<Tensor> {
        let (w, h) = image.dimensions();
        let chw = self.to_array(image)?;
        let data: Vec<f32> = chw.iter().copied().collect();
        Ok(Tensor::from_vec(data, (3, h as usize, w as usize), &self.device)?)
    }
}

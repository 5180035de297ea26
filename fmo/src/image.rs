//! # Pixel buffers

use crate::error::Error;
use crate::prelude::v1::*;
use bytemuck::{Pod, Zeroable};

/// Pixel layout of an [`Image`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Format {
    /// Single channel, one byte per pixel.
    Gray,
    /// Three interleaved channels in blue, green, red order.
    Bgr,
    /// Three interleaved channels in Y, U, V order.
    Yuv,
    /// Full resolution luma plane followed by an interleaved V, U plane at half resolution (NV21).
    Yuv420Sp,
    #[default]
    Unknown,
}

impl Format {
    /// Number of bytes between two horizontally adjacent pixels of the first plane.
    pub fn pixel_step(self) -> usize {
        match self {
            Format::Gray | Format::Yuv420Sp => 1,
            Format::Bgr | Format::Yuv => 3,
            Format::Unknown => 0,
        }
    }

    /// Number of bytes an image of this format requires.
    pub fn bytes(self, dims: Dims) -> usize {
        let pixels = dims.pixels();
        match self {
            Format::Gray => pixels,
            Format::Bgr | Format::Yuv => pixels * 3,
            Format::Yuv420Sp => (pixels * 3) / 2,
            Format::Unknown => 0,
        }
    }

    /// Check that images of this format can have the given dimensions.
    ///
    /// The chroma plane of `Yuv420Sp` covers 2x2 pixel blocks, so both dimensions must be even.
    pub fn check_dims(self, dims: Dims) -> Result<()> {
        if self == Format::Yuv420Sp && (dims.width % 2 != 0 || dims.height % 2 != 0) {
            return Err(anyhow!(
                "{:?} images must have even dimensions, got {}x{}",
                self,
                dims.width,
                dims.height
            ));
        }

        Ok(())
    }
}

/// Image dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct Dims {
    pub width: usize,
    pub height: usize,
}

impl Dims {
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub fn pixels(self) -> usize {
        self.width * self.height
    }

    /// Dimensions after one 2x2 decimation step.
    pub fn halved(self) -> Self {
        Self::new(self.width / 2, self.height / 2)
    }
}

/// BGR colour structure.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Bgr {
    pub b: u8,
    pub g: u8,
    pub r: u8,
}

impl Bgr {
    pub const fn new(b: u8, g: u8, r: u8) -> Self {
        Self { b, g, r }
    }

    pub const fn gray(v: u8) -> Self {
        Self { b: v, g: v, r: v }
    }

    /// Luma using the fixed-point Rec. 601 weights.
    pub fn luma(self) -> u8 {
        let v = self.r as u32 * 4899 + self.g as u32 * 9617 + self.b as u32 * 1868;
        ((v + (1 << 13)) >> 14) as u8
    }

    /// Convert from limited range BT.601 YUV.
    pub fn from_yuv(y: u8, u: u8, v: u8) -> Self {
        let c = (y as i32 - 16).max(0) * 298;
        let d = u as i32 - 128;
        let e = v as i32 - 128;
        let clamp = |x: i32| ((x + 128) >> 8).clamp(0, 255) as u8;
        Self {
            b: clamp(c + 516 * d),
            g: clamp(c - 100 * d - 208 * e),
            r: clamp(c + 409 * e),
        }
    }
}

/// Contiguous pixel buffer with a format tag and dimensions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Image {
    format: Format,
    dims: Dims,
    data: Vec<u8>,
}

impl Image {
    /// Create a zero-filled image.
    pub fn new(format: Format, dims: Dims) -> Self {
        Self {
            format,
            dims,
            data: vec![0; format.bytes(dims)],
        }
    }

    /// Create an image by copying existing pixel data.
    ///
    /// # Arguments
    ///
    /// * `format` - layout of `data`.
    /// * `dims` - dimensions of the image.
    /// * `data` - pixel bytes, exactly as many as `format` requires at `dims`.
    pub fn from_data(format: Format, dims: Dims, data: &[u8]) -> Result<Self> {
        format.check_dims(dims)?;

        let expected = format.bytes(dims);
        if data.len() != expected {
            return Err(anyhow!(
                "image data of {} bytes does not match {:?} at {}x{} ({} bytes)",
                data.len(),
                format,
                dims.width,
                dims.height,
                expected
            ));
        }

        Ok(Self {
            format,
            dims,
            data: data.to_vec(),
        })
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn dims(&self) -> Dims {
        self.dims
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Bytes in a single row of the first plane.
    pub fn skip(&self) -> usize {
        self.dims.width * self.format.pixel_step()
    }

    /// Change format and dimensions, reusing the allocation where possible.
    ///
    /// Pixel contents are unspecified afterwards.
    pub fn resize(&mut self, format: Format, dims: Dims) {
        self.data.resize(format.bytes(dims), 0);
        self.format = format;
        self.dims = dims;
    }

    /// Release the pixel data.
    pub fn clear(&mut self) {
        self.data.clear();
        self.dims = Dims::default();
        self.format = Format::Unknown;
    }

    /// Set every byte to `value`.
    pub fn fill(&mut self, value: u8) {
        self.data.iter_mut().for_each(|b| *b = value);
    }

    /// View a three channel image as pixels.
    pub fn as_bgr(&self) -> &[Bgr] {
        assert_eq!(self.format.pixel_step(), 3, "as_bgr: not a 3-channel image");
        bytemuck::cast_slice(&self.data)
    }

    /// View a three channel image as mutable pixels.
    pub fn as_bgr_mut(&mut self) -> &mut [Bgr] {
        assert_eq!(self.format.pixel_step(), 3, "as_bgr_mut: not a 3-channel image");
        bytemuck::cast_slice_mut(&mut self.data)
    }

    /// Check that the image has the expected format and dimensions.
    pub fn expect(&self, format: Format, dims: Dims) -> Result<()> {
        if self.format != format {
            return Err(Error::FormatMismatch {
                expected: format,
                actual: self.format,
            }
            .into());
        }

        if self.dims != dims {
            return Err(Error::DimsMismatch {
                expected: (dims.width, dims.height),
                actual: (self.dims.width, self.dims.height),
            }
            .into());
        }

        Ok(())
    }

    /// Convert `src` into `dst` using the given format.
    ///
    /// Converting to the source format produces an identical copy.
    pub fn convert(src: &Image, dst: &mut Image, format: Format) -> Result<()> {
        if src.format == format {
            dst.clone_from(src);
            return Ok(());
        }

        src.format.check_dims(src.dims)?;
        format.check_dims(src.dims)?;

        let pixels = src.dims.pixels();
        dst.resize(format, src.dims);

        match (src.format, format) {
            (Format::Bgr, Format::Gray) => {
                for (out, px) in dst.data.iter_mut().zip(src.as_bgr()) {
                    *out = px.luma();
                }
            }
            (Format::Gray, Format::Bgr) => {
                for (out, &v) in dst.as_bgr_mut().iter_mut().zip(&src.data) {
                    *out = Bgr::gray(v);
                }
            }
            (Format::Yuv, Format::Gray) => {
                for (out, px) in dst.data.iter_mut().zip(src.data.chunks_exact(3)) {
                    *out = px[0];
                }
            }
            (Format::Yuv, Format::Bgr) => {
                let yuv = src.data.chunks_exact(3);
                for (out, px) in dst.as_bgr_mut().iter_mut().zip(yuv) {
                    *out = Bgr::from_yuv(px[0], px[1], px[2]);
                }
            }
            (Format::Yuv420Sp, Format::Gray) => {
                dst.data.copy_from_slice(&src.data[..pixels]);
            }
            (Format::Yuv420Sp, Format::Bgr) => {
                let Dims { width, height } = src.dims;
                let (luma, chroma) = src.data.split_at(pixels);
                let out = dst.as_bgr_mut();
                for row in 0..height {
                    let chroma_row = &chroma[(row / 2) * width..];
                    for col in 0..width {
                        let vu = &chroma_row[(col / 2) * 2..];
                        let y = luma[row * width + col];
                        out[row * width + col] = Bgr::from_yuv(y, vu[1], vu[0]);
                    }
                }
            }
            (from, to) => {
                dst.clear();
                return Err(Error::UnsupportedConversion { from, to }.into());
            }
        }

        Ok(())
    }

    /// Convert the image to another format in place.
    ///
    /// Converting `Yuv420Sp` to `Gray` only drops the chroma plane.
    pub fn convert_in_place(&mut self, format: Format) -> Result<()> {
        if self.format == format {
            return Ok(());
        }

        if self.format == Format::Yuv420Sp && format == Format::Gray {
            self.data.truncate(Format::Gray.bytes(self.dims));
            self.format = Format::Gray;
            return Ok(());
        }

        let mut temp = Image::default();
        Image::convert(self, &mut temp, format)?;
        *self = temp;
        Ok(())
    }
}

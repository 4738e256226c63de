use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};

pub const DIFFUSE_FILE: &str = "container2.png";
pub const SPECULAR_FILE: &str = "container2_specular.png";

/// Edge length of the generated stand-in textures.
const PLACEHOLDER_SIZE: u32 = 64;
/// Width of the metal rim on the generated crate face.
const PLACEHOLDER_RIM: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialMap {
    Diffuse,
    Specular,
}

impl MaterialMap {
    fn file_name(self) -> &'static str {
        match self {
            MaterialMap::Diffuse => DIFFUSE_FILE,
            MaterialMap::Specular => SPECULAR_FILE,
        }
    }
}

/// Decoded RGBA8 pixels ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl TextureImage {
    pub fn load(path: &Path) -> Result<Self> {
        let image = image::open(path)
            .with_context(|| format!("failed to decode texture {}", path.display()))?;
        let rgba = image.to_rgba8();
        Ok(Self {
            width: rgba.width(),
            height: rgba.height(),
            pixels: rgba.into_raw(),
        })
    }

    /// Crate-face stand-in: wooden panel inside a metal rim. The specular
    /// variant is bright on the rim and dark on the wood.
    pub fn placeholder(map: MaterialMap) -> Self {
        let size = PLACEHOLDER_SIZE;
        let mut pixels = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let on_rim = x < PLACEHOLDER_RIM
                    || y < PLACEHOLDER_RIM
                    || x >= size - PLACEHOLDER_RIM
                    || y >= size - PLACEHOLDER_RIM;
                let texel = match (map, on_rim) {
                    (MaterialMap::Diffuse, true) => [128, 128, 136, 255],
                    (MaterialMap::Diffuse, false) => {
                        let grain = if (y / 8) % 2 == 0 { 0 } else { 12 };
                        [150 - grain, 100 - grain, 52 - grain / 2, 255]
                    }
                    (MaterialMap::Specular, true) => [255, 255, 255, 255],
                    (MaterialMap::Specular, false) => [0, 0, 0, 255],
                };
                pixels.extend_from_slice(&texel);
            }
        }
        Self {
            width: size,
            height: size,
            pixels,
        }
    }

    pub fn load_or_placeholder(dir: &Path, map: MaterialMap) -> Self {
        let path = dir.join(map.file_name());
        match Self::load(&path) {
            Ok(image) => {
                info!(
                    "loaded texture {} ({}x{})",
                    path.display(),
                    image.width,
                    image.height
                );
                image
            }
            Err(err) => {
                warn!("{err:#}; using generated placeholder");
                Self::placeholder(map)
            }
        }
    }
}

/// Diffuse and specular maps shared by every lit mesh.
#[derive(Debug, Clone)]
pub struct MaterialImages {
    pub diffuse: TextureImage,
    pub specular: TextureImage,
}

impl MaterialImages {
    pub fn load(dir: &Path) -> Self {
        Self {
            diffuse: TextureImage::load_or_placeholder(dir, MaterialMap::Diffuse),
            specular: TextureImage::load_or_placeholder(dir, MaterialMap::Specular),
        }
    }
}

pub(crate) struct GpuTexture {
    _texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
}

impl GpuTexture {
    // Both maps hold raw colour data; gamma is applied in the shader.
    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    pub(crate) fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &TextureImage,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(image.width * 4),
                rows_per_image: Some(image.height),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

pub(crate) fn material_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("material-sampler"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texel(image: &TextureImage, x: u32, y: u32) -> &[u8] {
        let start = ((y * image.width + x) * 4) as usize;
        &image.pixels[start..start + 4]
    }

    #[test]
    fn placeholder_is_square_rgba() {
        let image = TextureImage::placeholder(MaterialMap::Diffuse);
        assert_eq!(image.width, PLACEHOLDER_SIZE);
        assert_eq!(image.height, PLACEHOLDER_SIZE);
        assert_eq!(image.pixels.len(), (PLACEHOLDER_SIZE * PLACEHOLDER_SIZE * 4) as usize);
    }

    #[test]
    fn specular_placeholder_only_shines_on_rim() {
        let image = TextureImage::placeholder(MaterialMap::Specular);
        assert_eq!(texel(&image, 0, 0), [255, 255, 255, 255]);
        assert_eq!(texel(&image, 32, 32), [0, 0, 0, 255]);
    }

    #[test]
    fn missing_directory_falls_back_to_placeholders() {
        let images = MaterialImages::load(Path::new("does/not/exist"));
        assert_eq!(images.diffuse, TextureImage::placeholder(MaterialMap::Diffuse));
        assert_eq!(images.specular, TextureImage::placeholder(MaterialMap::Specular));
    }
}

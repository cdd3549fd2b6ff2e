use std::path::Path;

use anyhow::Context;

use crate::data_structures::material::{TextureRef, TextureSlot};

#[cfg(target_arch = "wasm32")]
fn format_url(asset_root: &Path, file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().ok_or_else(|| anyhow::anyhow!("no browser window"))?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| anyhow::anyhow!("page origin is not readable"))?;
    let base = reqwest::Url::parse(&format!("{}/{}/", origin, asset_root.display()))?;
    Ok(base.join(file_name)?)
}

pub async fn load_binary(asset_root: &Path, file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(asset_root, file_name)?;
        reqwest::get(url).await?.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = asset_root.join(file_name);
        std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?
    };

    Ok(data)
}

pub async fn load_string(asset_root: &Path, file_name: &str) -> anyhow::Result<String> {
    let bytes = load_binary(asset_root, file_name).await?;
    String::from_utf8(bytes).with_context(|| format!("{} is not valid UTF-8", file_name))
}

/**
 * Resolves a URI found inside a GLTF file against the directory of that file.
 *
 * `models/bird.gltf` referencing `bird.bin` yields `models/bird.bin`.
 */
pub fn sibling_path(file_name: &str, uri: &str) -> String {
    match file_name.rfind('/') {
        Some(idx) => format!("{}/{}", &file_name[..idx], uri),
        None => uri.to_string(),
    }
}

/// Describes where a material texture comes from without decoding it.
pub fn texture_ref(slot: TextureSlot, file_name: &str, texture: gltf::Texture) -> TextureRef {
    let source = match texture.source().source() {
        gltf::image::Source::Uri { uri, .. } => sibling_path(file_name, uri),
        gltf::image::Source::View { view, .. } => {
            format!("{}#bufferView{}", file_name, view.index())
        }
    };
    TextureRef::new(slot, source)
}

use std::env;
use std::path::PathBuf;

use anyhow::Result;
use fs_extra::copy_items;
use fs_extra::dir::CopyOptions;

/// Ship the `assets/` directory (OBJ models, textures) next to the build
/// output so the viewer finds them at runtime.
fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=assets/*");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    if !manifest_dir.join("assets").exists() {
        return Ok(());
    }

    let out_dir = env::var("OUT_DIR")?;
    let copy_options = CopyOptions::new().overwrite(true);
    copy_items(&["assets/"], out_dir, &copy_options)?;

    Ok(())
}

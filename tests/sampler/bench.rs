use gltexstate::gfx::backends::recording::RecordingDriver;
use gltexstate::{
    Caches, InUseToken, SamplerApply, SamplerFilter, SamplerWrap, ScopedTexture, Texture,
    TextureConfig, TextureOps, reset_in_use,
};
use log::info;
use std::time::Instant;

const TEXTURES: usize = 256;
const FRAMES: u64 = 600;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install logger immediately, then set runtime max level from config after loading it.
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Trace)
        .try_init();
    log::set_max_level(log::LevelFilter::Warn);

    let config = TextureConfig::load(gltexstate::config::CONFIG_PATH);
    log::set_max_level(config.log_level.as_level_filter());

    let caches = Caches::new(RecordingDriver::new(), config);
    let mut textures: Vec<Texture<'_, RecordingDriver>> = (0..TEXTURES)
        .map(|i| {
            let mut t = Texture::with_id(&caches, caches.driver().create_texture(), 128, 128);
            t.bitmap_size = 128 * 128 * 4;
            t.mip_map = i % 4 == 0;
            t
        })
        .collect();

    let start = Instant::now();
    let mut requested: u64 = 0;
    for frame in 1..=FRAMES {
        let token = InUseToken::new(frame).ok_or("frame tokens start at 1")?;
        reset_in_use(textures.iter_mut());
        for (i, tex) in textures.iter_mut().enumerate() {
            // Most draws repeat last frame's state; a few flip wrap mode.
            let wrap = if (i as u64 + frame) % 64 == 0 {
                SamplerWrap::Repeat
            } else {
                SamplerWrap::Clamp
            };
            let filter = if tex.mip_map {
                SamplerFilter::LinearMipmapLinear
            } else {
                SamplerFilter::Linear
            };
            tex.set_wrap(wrap, SamplerApply::default());
            tex.set_filter(filter, SamplerApply::default());
            tex.mark_in_use(token);
            requested += 4;
        }

        // A transient texture per frame, released through a guard.
        let mut scratch = Texture::with_id(&caches, caches.driver().create_texture(), 16, 16);
        scratch.cleanup = true;
        let mut guard = ScopedTexture::new(Box::new(scratch));
        if let Some(t) = guard.get_mut() {
            t.set_filter(SamplerFilter::Nearest, SamplerApply::rebind());
        }
    }
    let elapsed = start.elapsed();

    let stats = caches.stats();
    let violations = caches.driver().violations().len();
    info!("Sampler bench finished in {elapsed:?}.");
    println!(
        "frames={FRAMES} textures={TEXTURES} requested_params={requested} issued_params={} \
         binds={} skipped_binds={} deletes={} violations={violations} elapsed={elapsed:?}",
        stats.parameters, stats.binds, stats.skipped_binds, stats.deletes
    );
    if violations > 0 {
        return Err(format!("{violations} driver calls touched invalid handles").into());
    }
    Ok(())
}

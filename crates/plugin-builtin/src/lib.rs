//! # plugin-builtin
//!
//! Plugins compiled into the `pixel-art` binary.
//!
//! | Module stem             | Type                  | Capability |
//! |-------------------------|-----------------------|------------|
//! | `display_image_plugins` | `DisplayImagePlugins` | display    |
//! | `fill_screen_plugins`   | `FillScreenPlugins`   | display    |
//! | `random_pixel_plugins`  | `RandomPixelPlugins`  | display    |
//! | `image_source`          | `ImageSource`         | cognitive  |
//! | `emotion_cycler`        | `EmotionCycler`       | cognitive  |
//! | `bounce_game`           | `BounceGame`          | game       |
//!
//! A module is only instantiated when a `<stem>.plugin.toml` manifest for it
//! is discovered under the plugin directory.

pub mod bounce_game;
pub mod canvas;
pub mod display_image;
pub mod emotion;
pub mod fill_screen;
pub mod image_source;
pub mod palette;
pub mod random_pixel;

use std::sync::Arc;

use pixelart_plugin::{Plugin, PluginCatalog};

pub use bounce_game::BounceGame;
pub use display_image::DisplayImagePlugins;
pub use emotion::EmotionCycler;
pub use fill_screen::FillScreenPlugins;
pub use image_source::ImageSource;
pub use random_pixel::RandomPixelPlugins;

/// Catalog of every built-in module.
pub fn catalog() -> PluginCatalog {
    PluginCatalog::new()
        .with(display_image::MODULE, |ctx| {
            Ok(vec![Arc::new(DisplayImagePlugins::from_context(ctx)?) as Arc<dyn Plugin>])
        })
        .with(fill_screen::MODULE, |ctx| {
            Ok(vec![Arc::new(FillScreenPlugins::from_context(ctx)?) as Arc<dyn Plugin>])
        })
        .with(random_pixel::MODULE, |ctx| {
            Ok(vec![Arc::new(RandomPixelPlugins::from_context(ctx)?) as Arc<dyn Plugin>])
        })
        .with(image_source::MODULE, |ctx| {
            Ok(vec![Arc::new(ImageSource::from_context(ctx)?) as Arc<dyn Plugin>])
        })
        .with(emotion::MODULE, |ctx| {
            Ok(vec![Arc::new(EmotionCycler::from_context(ctx)?) as Arc<dyn Plugin>])
        })
        .with(bounce_game::MODULE, |ctx| {
            Ok(vec![Arc::new(BounceGame::from_context(ctx)?) as Arc<dyn Plugin>])
        })
}

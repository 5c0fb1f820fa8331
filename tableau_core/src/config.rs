// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stage-wide configuration.

use url::Url;

/// Playback settings applied to video contents when they are requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VideoPlayback {
    /// Restart from the beginning when the end is reached.
    pub looping: bool,
    /// Start with audio muted.
    pub muted: bool,
    /// Start playing as soon as enough data is buffered.
    pub autoplay: bool,
    /// Play inline rather than in a platform fullscreen player.
    pub plays_inline: bool,
}

impl Default for VideoPlayback {
    fn default() -> Self {
        Self {
            looping: true,
            muted: true,
            autoplay: true,
            plays_inline: true,
        }
    }
}

/// Configuration for a [`LayerStore`](crate::layer::LayerStore).
#[derive(Clone, Debug)]
pub struct StageConfig {
    /// Base URL against which relative contents sources are resolved.
    pub base_url: Url,
    /// Lowercase file extensions that are loaded as video.
    pub video_extensions: Vec<String>,
    /// Initial `hit_test_mask_threshold` of newly created layers.
    pub default_hit_test_mask_threshold: u8,
    /// Hide layers while their contents source loads, and un-hide on success.
    pub auto_hide_on_load: bool,
    /// Playback settings for video sources.
    pub video_playback: VideoPlayback,
}

impl StageConfig {
    /// Extensions of the audio/video MIME types the stage can play.
    pub const VIDEO_EXTENSIONS: [&'static str; 6] = ["mp4", "m4v", "mov", "webm", "mp3", "wav"];

    /// Returns `true` if `extension` (case-insensitive) names a video format.
    #[must_use]
    pub fn is_video_extension(&self, extension: &str) -> bool {
        let ext = extension.trim().to_ascii_lowercase();
        self.video_extensions.iter().any(|v| *v == ext)
    }
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("file:///").expect("static base URL is valid"),
            video_extensions: Self::VIDEO_EXTENSIONS
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
            default_hit_test_mask_threshold: 0,
            auto_hide_on_load: true,
            video_playback: VideoPlayback::default(),
        }
    }
}

use crate::viewport::ImageHandle;

/// The surrounding viewer session: which image is currently selected and
/// whether cine playback is running. Only consulted as a fallback source
/// when a layout has nothing to restore, and for navigation.
pub trait SessionProvider {
    /// The image the session currently has selected, if any.
    fn current_image(&self) -> Option<ImageHandle>;

    fn total_images(&self) -> usize;

    /// Step the selection by `delta` images. Returns the newly selected image.
    fn navigate(&mut self, delta: i64) -> Option<ImageHandle>;

    fn is_playing(&self) -> bool {
        false
    }

    fn stop_cine(&mut self) {}

    fn start_cine(&mut self) {}
}

/// Session over an ordered image series.
#[derive(Clone, Debug, Default)]
pub struct SeriesSession {
    images: Vec<ImageHandle>,
    current: usize,
    playing: bool,
}

impl SeriesSession {
    pub fn new(images: Vec<ImageHandle>) -> Self {
        Self {
            images,
            current: 0,
            playing: false,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn select(&mut self, index: usize) {
        if index < self.images.len() {
            self.current = index;
        }
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }
}

impl SessionProvider for SeriesSession {
    fn current_image(&self) -> Option<ImageHandle> {
        self.images.get(self.current).cloned()
    }

    fn total_images(&self) -> usize {
        self.images.len()
    }

    fn navigate(&mut self, delta: i64) -> Option<ImageHandle> {
        if self.images.is_empty() {
            return None;
        }
        let last = self.images.len() as i64 - 1;
        self.current = (self.current as i64 + delta).clamp(0, last) as usize;
        self.current_image()
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn stop_cine(&mut self) {
        self.playing = false;
    }

    fn start_cine(&mut self) {
        self.playing = true;
    }
}

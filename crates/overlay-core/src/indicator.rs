// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Top-bar weather indicator.

/// Default icon height on the top bar, in pixels.
pub const DEFAULT_INDICATOR_HEIGHT_PX: u32 = 50;

/// The single image element shown in the indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorImage {
    pub src: String,
    pub style: String,
}

/// Holds at most one weather icon for the cell dominating the viewport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherIndicator {
    image: Option<IndicatorImage>,
    height_px: u32,
}

impl WeatherIndicator {
    #[must_use]
    pub fn new(height_px: u32) -> Self {
        Self {
            image: None,
            height_px,
        }
    }

    /// Replace whatever is shown with the icon at `src`.
    pub fn show(&mut self, src: String) {
        self.image = Some(IndicatorImage {
            src,
            style: format!("height: {}px; vertical-align: middle;", self.height_px),
        });
    }

    pub fn clear(&mut self) {
        self.image = None;
    }

    #[must_use]
    pub fn image(&self) -> Option<&IndicatorImage> {
        self.image.as_ref()
    }
}

impl Default for WeatherIndicator {
    fn default() -> Self {
        Self::new(DEFAULT_INDICATOR_HEIGHT_PX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_replaces_previous_icon() {
        let mut indicator = WeatherIndicator::default();
        indicator.show("/a.png".to_string());
        indicator.show("/b.png".to_string());

        let image = indicator.image().unwrap();
        assert_eq!(image.src, "/b.png");
        assert_eq!(image.style, "height: 50px; vertical-align: middle;");

        indicator.clear();
        assert!(indicator.image().is_none());
    }

    #[test]
    fn test_custom_height() {
        let mut indicator = WeatherIndicator::new(32);
        indicator.show("/a.png".to_string());
        assert_eq!(indicator.image().unwrap().style, "height: 32px; vertical-align: middle;");
    }
}

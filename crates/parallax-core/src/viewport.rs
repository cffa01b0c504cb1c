// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Viewport registers and the viewport classifier.
//!
//! Rules are evaluated in order and the first match wins:
//!
//! 1. small square flush to a screen edge, side a power of two or multiple of 8: render-to-texture
//! 2. the 256×224 mini-map target at the origin: render-to-texture
//! 3. ≥90% of both screen dimensions with every edge inside a 10% tolerance:
//!    fullscreen on an exact match, letterboxed otherwise
//! 4. full-width half-height strip: top/bottom split-screen slot
//! 5. full-height half-width strip: left/right split-screen slot
//! 6. half-width half-height: quadrant slot
//! 7. entirely outside the screen: offscreen
//! 8. anything else: HUD element
//!
//! Split-screen rules also advance a sticky [`SplitscreenKind`] that lives for
//! the whole session and disambiguates 3-player layouts.

use tracing::trace;

/// Fixed-point divisor for the depth registers.
pub const DEPTH_DIVISOR: f32 = 16_777_216.0;

/// Origin offset the legacy pipeline adds to viewport centres.
pub const VIEWPORT_ORIGIN_OFFSET: f32 = 342.0;

const EDGE_TOLERANCE: f32 = 0.1;
const FULL_FRACTION: f32 = 0.9;
const HALF_MIN: f32 = 0.45;
const HALF_MAX: f32 = 0.5;
const PIXEL_SLOP: f32 = 0.5;
const MINIMAP_RTT: (f32, f32, f32, f32) = (0.0, 0.0, 256.0, 224.0);
const SKYBOX_NEAR: f32 = 0.99;
const SKYBOX_FAR: f32 = 0.999;

/// Viewport registers for one batch.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewportRect {
    /// Centre x plus the 342 origin offset.
    pub x_orig: f32,
    /// Centre y plus the 342 origin offset.
    pub y_orig: f32,
    /// Half width.
    pub half_width: f32,
    /// Half height, negative for a top-down viewport.
    pub half_height: f32,
    /// Far depth, fixed point.
    pub far_z: f32,
    /// Depth range, fixed point.
    pub z_range: f32,
}

impl ViewportRect {
    /// Encodes pixel edges and a normalised depth range into registers.
    pub fn from_edges(left: f32, top: f32, width: f32, height: f32, near: f32, far: f32) -> Self {
        let half_width = width * 0.5;
        let half_height = -height * 0.5;
        Self {
            x_orig: left + half_width + VIEWPORT_ORIGIN_OFFSET,
            y_orig: top - half_height + VIEWPORT_ORIGIN_OFFSET,
            half_width,
            half_height,
            far_z: far * DEPTH_DIVISOR,
            z_range: (far - near) * DEPTH_DIVISOR,
        }
    }

    /// Left edge in pixels.
    pub fn left(&self) -> f32 {
        self.x_orig - self.half_width - VIEWPORT_ORIGIN_OFFSET
    }

    /// Top edge in pixels.
    pub fn top(&self) -> f32 {
        self.y_orig + self.half_height - VIEWPORT_ORIGIN_OFFSET
    }

    /// Width in pixels.
    pub fn width(&self) -> f32 {
        2.0 * self.half_width
    }

    /// Height in pixels.
    pub fn height(&self) -> f32 {
        -2.0 * self.half_height
    }

    /// Right edge in pixels.
    pub fn right(&self) -> f32 {
        self.left() + self.width()
    }

    /// Bottom edge in pixels.
    pub fn bottom(&self) -> f32 {
        self.top() + self.height()
    }

    /// Normalised near depth.
    pub fn near(&self) -> f32 {
        (self.far_z - self.z_range) / DEPTH_DIVISOR
    }

    /// Normalised far depth.
    pub fn far(&self) -> f32 {
        self.far_z / DEPTH_DIVISOR
    }

    pub(crate) fn bits(&self) -> [u32; 6] {
        [
            self.x_orig.to_bits(),
            self.y_orig.to_bits(),
            self.half_width.to_bits(),
            self.half_height.to_bits(),
            self.far_z.to_bits(),
            self.z_range.to_bits(),
        ]
    }
}

/// Region of the EFB copied to the output ("final screen region").
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScreenRegion {
    /// Left edge in pixels.
    pub left: f32,
    /// Top edge in pixels.
    pub top: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

impl ScreenRegion {
    /// Region anchored at the origin.
    pub const fn sized(width: f32, height: f32) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width,
            height,
        }
    }

    /// Right edge.
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Zero or negative extent.
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Semantic kind of a viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ViewportKind {
    /// Matches the screen exactly.
    Fullscreen,
    /// Nearly fills the screen (letterbox/pillarbox borders).
    Letterboxed,
    /// A sub-rectangle holding part of the HUD.
    HudElement,
    /// Entirely outside the visible screen.
    Offscreen,
    /// Renders into a texture read back later.
    RenderToTexture,
    /// Split-screen slot 1.
    Player1,
    /// Split-screen slot 2.
    Player2,
    /// Split-screen slot 3.
    Player3,
    /// Split-screen slot 4.
    Player4,
}

impl ViewportKind {
    /// Split-screen slot number (1..=4), if any.
    pub fn player(self) -> Option<u8> {
        match self {
            Self::Player1 => Some(1),
            Self::Player2 => Some(2),
            Self::Player3 => Some(3),
            Self::Player4 => Some(4),
            _ => None,
        }
    }

    /// Kinds that may carry the skybox flag.
    pub fn allows_skybox(self) -> bool {
        matches!(self, Self::Fullscreen | Self::Letterboxed) || self.player().is_some()
    }

    /// Kinds whose position on screen is mapped onto the HUD box.
    pub fn is_sub_screen(self) -> bool {
        matches!(self, Self::HudElement | Self::Offscreen)
    }

    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fullscreen => "fullscreen",
            Self::Letterboxed => "letterboxed",
            Self::HudElement => "hud_element",
            Self::Offscreen => "offscreen",
            Self::RenderToTexture => "render_to_texture",
            Self::Player1 => "player1",
            Self::Player2 => "player2",
            Self::Player3 => "player3",
            Self::Player4 => "player4",
        }
    }
}

/// Sticky split-screen layout inferred from the slots seen so far.
///
/// `ThreePlayerX` names the side held by the single full-size strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SplitscreenKind {
    /// No split-screen seen.
    #[default]
    None,
    /// Top and bottom strips.
    TwoPlayerHorizontal,
    /// Left and right strips.
    TwoPlayerVertical,
    /// Full-width strip on top, two quadrants below.
    ThreePlayerTop,
    /// Two quadrants on top, full-width strip below.
    ThreePlayerBottom,
    /// Full-height strip on the left, two quadrants on the right.
    ThreePlayerLeft,
    /// Two quadrants on the left, full-height strip on the right.
    ThreePlayerRight,
    /// Four quadrants.
    FourPlayer,
}

/// Result of classifying one viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewportClassification {
    /// Semantic kind.
    pub kind: ViewportKind,
    /// Depth range collapsed onto the far plane.
    pub skybox: bool,
    /// Sticky layout after this viewport was seen.
    pub splitscreen: SplitscreenKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strip {
    Top,
    Bottom,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Classifies viewports against the final screen region.
#[derive(Debug, Clone, Default)]
pub struct ViewportClassifier {
    splitscreen: SplitscreenKind,
}

impl ViewportClassifier {
    /// Fresh classifier with no split-screen history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current sticky layout.
    pub fn splitscreen(&self) -> SplitscreenKind {
        self.splitscreen
    }

    /// Classifies `viewport` and advances the sticky split-screen layout.
    pub fn classify(&mut self, viewport: &ViewportRect, screen: &ScreenRegion) -> ViewportClassification {
        let kind = self.classify_kind(viewport, screen);
        let skybox = kind.allows_skybox() && viewport.near() >= SKYBOX_NEAR && viewport.far() >= SKYBOX_FAR;
        trace!(kind = kind.as_str(), skybox, "viewport classified");
        ViewportClassification {
            kind,
            skybox,
            splitscreen: self.splitscreen,
        }
    }

    fn classify_kind(&mut self, vp: &ViewportRect, screen: &ScreenRegion) -> ViewportKind {
        if screen.is_degenerate() {
            return ViewportKind::Fullscreen;
        }
        let (left, top, width, height) = (vp.left(), vp.top(), vp.width(), vp.height());
        let (right, bottom) = (vp.right(), vp.bottom());
        let fw = width / screen.width;
        let fh = height / screen.height;

        if is_rtt_square(vp, screen) || is_minimap_target(left, top, width, height) {
            return ViewportKind::RenderToTexture;
        }

        if fw >= FULL_FRACTION && fh >= FULL_FRACTION {
            let tol_x = EDGE_TOLERANCE * screen.width;
            let tol_y = EDGE_TOLERANCE * screen.height;
            let within = |a: f32, b: f32, tol: f32| (a - b).abs() <= tol;
            if within(left, screen.left, tol_x)
                && within(right, screen.right(), tol_x)
                && within(top, screen.top, tol_y)
                && within(bottom, screen.bottom(), tol_y)
            {
                let exact = within(left, screen.left, PIXEL_SLOP)
                    && within(right, screen.right(), PIXEL_SLOP)
                    && within(top, screen.top, PIXEL_SLOP)
                    && within(bottom, screen.bottom(), PIXEL_SLOP);
                return if exact {
                    ViewportKind::Fullscreen
                } else {
                    ViewportKind::Letterboxed
                };
            }
        }

        let half = |f: f32| (HALF_MIN..=HALF_MAX + 1e-4).contains(&f);
        let centre_x = left + width * 0.5;
        let centre_y = top + height * 0.5;
        let on_left = centre_x < screen.left + screen.width * 0.5;
        let on_top = centre_y < screen.top + screen.height * 0.5;

        if fw >= FULL_FRACTION && half(fh) {
            let strip = if on_top { Strip::Top } else { Strip::Bottom };
            return self.strip_slot(strip);
        }
        if fh >= FULL_FRACTION && half(fw) {
            let strip = if on_left { Strip::Left } else { Strip::Right };
            return self.strip_slot(strip);
        }
        if half(fw) && half(fh) {
            let corner = match (on_top, on_left) {
                (true, true) => Corner::TopLeft,
                (true, false) => Corner::TopRight,
                (false, true) => Corner::BottomLeft,
                (false, false) => Corner::BottomRight,
            };
            return self.quadrant_slot(corner);
        }

        if right <= screen.left || left >= screen.right() || bottom <= screen.top || top >= screen.bottom() {
            return ViewportKind::Offscreen;
        }
        ViewportKind::HudElement
    }

    fn strip_slot(&mut self, strip: Strip) -> ViewportKind {
        use SplitscreenKind as S;
        self.splitscreen = match (self.splitscreen, strip) {
            (S::None | S::TwoPlayerHorizontal | S::TwoPlayerVertical, Strip::Top | Strip::Bottom) => {
                S::TwoPlayerHorizontal
            }
            (S::None | S::TwoPlayerHorizontal | S::TwoPlayerVertical, Strip::Left | Strip::Right) => {
                S::TwoPlayerVertical
            }
            (S::FourPlayer, Strip::Top) => S::ThreePlayerTop,
            (S::FourPlayer, Strip::Bottom) => S::ThreePlayerBottom,
            (S::FourPlayer, Strip::Left) => S::ThreePlayerLeft,
            (S::FourPlayer, Strip::Right) => S::ThreePlayerRight,
            (current, _) => current,
        };
        match strip {
            Strip::Top | Strip::Left => ViewportKind::Player1,
            Strip::Bottom if self.splitscreen == S::ThreePlayerBottom => ViewportKind::Player3,
            Strip::Right if self.splitscreen == S::ThreePlayerRight => ViewportKind::Player3,
            Strip::Bottom | Strip::Right => ViewportKind::Player2,
        }
    }

    fn quadrant_slot(&mut self, corner: Corner) -> ViewportKind {
        use SplitscreenKind as S;
        let left_side = matches!(corner, Corner::TopLeft | Corner::BottomLeft);
        let top_side = matches!(corner, Corner::TopLeft | Corner::TopRight);
        self.splitscreen = match self.splitscreen {
            S::None => S::FourPlayer,
            S::TwoPlayerVertical if left_side => S::ThreePlayerRight,
            S::TwoPlayerVertical => S::ThreePlayerLeft,
            S::TwoPlayerHorizontal if top_side => S::ThreePlayerBottom,
            S::TwoPlayerHorizontal => S::ThreePlayerTop,
            current => current,
        };
        let [top_left, top_right, bottom_left, bottom_right] = match self.splitscreen {
            S::ThreePlayerRight => [1, 3, 2, 3],
            S::ThreePlayerLeft => [1, 2, 1, 3],
            S::ThreePlayerBottom => [1, 2, 3, 3],
            S::ThreePlayerTop => [1, 1, 2, 3],
            _ => [1, 2, 3, 4],
        };
        let slot = match corner {
            Corner::TopLeft => top_left,
            Corner::TopRight => top_right,
            Corner::BottomLeft => bottom_left,
            Corner::BottomRight => bottom_right,
        };
        match slot {
            1 => ViewportKind::Player1,
            2 => ViewportKind::Player2,
            3 => ViewportKind::Player3,
            _ => ViewportKind::Player4,
        }
    }
}

fn is_rtt_square(vp: &ViewportRect, screen: &ScreenRegion) -> bool {
    let (width, height) = (vp.width(), vp.height());
    if (width - height).abs() > PIXEL_SLOP || width >= screen.width || height >= screen.height {
        return false;
    }
    let flush = |a: f32, b: f32| (a - b).abs() <= PIXEL_SLOP;
    let flush_to_edge = flush(vp.left(), screen.left)
        || flush(vp.right(), screen.right())
        || flush(vp.top(), screen.top)
        || flush(vp.bottom(), screen.bottom());
    if !flush_to_edge {
        return false;
    }
    let side = width.round();
    if side < 1.0 {
        return false;
    }
    let side = side as u32;
    side.is_power_of_two() || side % 8 == 0
}

fn is_minimap_target(left: f32, top: f32, width: f32, height: f32) -> bool {
    let (l, t, w, h) = MINIMAP_RTT;
    (left - l).abs() <= PIXEL_SLOP
        && (top - t).abs() <= PIXEL_SLOP
        && (width - w).abs() <= PIXEL_SLOP
        && (height - h).abs() <= PIXEL_SLOP
}

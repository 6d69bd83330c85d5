use serde::Serialize;

use crate::config::constants;

/// A colour slot in a WLED segment, either RGB or RGBW.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Color {
    Rgb([u8; 3]),
    Rgbw([u8; 4]),
}

/// One entry of the WLED `seg` array.
///
/// Only the fields that are set are serialized, so an empty segment
/// (`{"stop": 0}`) deletes whatever segment occupied that slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SegmentCommand {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<u32>,
    pub stop: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bri: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub col: Option<[Color; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fx: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sx: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ix: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rev: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c1: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c2: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c3: Option<u8>,
}

impl SegmentCommand {
    fn empty() -> Self {
        Self::default()
    }
}

/// Full WLED state document posted to `/json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderCommand {
    pub on: bool,
    pub bri: u8,
    pub seg: Vec<SegmentCommand>,
}

impl RenderCommand {
    fn lit(seg: Vec<SegmentCommand>) -> Self {
        Self {
            on: true,
            bri: 255,
            seg,
        }
    }
}

/// What the strip should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderProfile {
    /// Progress bar of the heat-up, red filling over blue.
    Heating,
    /// Progress bar of the job, green filling over red.
    Printing,
    /// Full strip in Prusa orange.
    Idle,
    /// Magenta/cyan chase over the whole strip.
    SwitchingFilament,
    /// Fireworks over the whole strip.
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Palette {
    PrusaOrange,
    RedBreath,
    GreenGradient,
    BlueBreath,
    RedGradient,
}

/// Maps a profile and a percentage to the WLED command for one strip layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedProfiles {
    leds: u32,
    rows: u32,
}

impl LedProfiles {
    /// `leds` must be a non-zero multiple of `rows`; `Config` enforces that.
    pub fn new(leds: u32, rows: u32) -> Self {
        let rows = rows.max(1);
        Self {
            leds: leds.max(rows),
            rows,
        }
    }

    pub fn leds(&self) -> u32 {
        self.leds
    }

    fn leds_per_row(&self) -> u32 {
        self.leds / self.rows
    }

    /// Build the command for `profile`.
    ///
    /// `percentage` is only read by the progress-bar profiles.
    pub fn render(&self, profile: RenderProfile, percentage: f64) -> RenderCommand {
        match profile {
            RenderProfile::Printing => {
                self.progress_matrix(Palette::RedBreath, Palette::GreenGradient, percentage)
            }
            RenderProfile::Heating => {
                self.progress_matrix(Palette::BlueBreath, Palette::RedGradient, percentage)
            }
            RenderProfile::Idle => {
                self.progress_matrix(Palette::PrusaOrange, Palette::PrusaOrange, 100.0)
            }
            RenderProfile::SwitchingFilament => self.full_strip(SegmentCommand {
                col: Some([
                    Color::Rgbw([0, 150, 250, 0]),
                    Color::Rgbw([250, 60, 120, 0]),
                    Color::Rgbw([0, 0, 0, 0]),
                ]),
                fx: Some(50),
                sx: Some(100),
                ix: Some(255),
                ..SegmentCommand::empty()
            }),
            RenderProfile::Finished => self.full_strip(SegmentCommand {
                col: Some([
                    Color::Rgbw([8, 255, 0, 0]),
                    Color::Rgb([9, 255, 0]),
                    Color::Rgb([0, 55, 255]),
                ]),
                fx: Some(64),
                sx: Some(156),
                ix: Some(119),
                c1: Some(128),
                c2: Some(128),
                c3: Some(16),
                ..SegmentCommand::empty()
            }),
        }
    }

    /// Number of LEDs lit per row at `percentage`, between 1 and a full row.
    pub fn lit_leds(&self, percentage: f64) -> u32 {
        let per_percent = self.leds as f64 / self.rows as f64 / 100.0;
        let lit = (percentage.max(0.0) * per_percent + 1.0).floor() as u32;
        lit.clamp(1, self.leds_per_row())
    }

    fn progress_matrix(&self, base: Palette, fill: Palette, percentage: f64) -> RenderCommand {
        let lit = self.lit_leds(percentage);
        let per_row = self.leds_per_row();

        let mut seg = Vec::with_capacity(self.rows as usize * 2);
        for row in 0..self.rows {
            let row_start = row * per_row;
            let row_end = row_start + per_row;
            let boundary = row_end - lit;

            seg.push(SegmentCommand {
                start: Some(row_start),
                stop: boundary,
                bri: Some(255),
                ..self.palette(base, lit)
            });
            seg.push(SegmentCommand {
                start: Some(boundary),
                stop: row_end,
                bri: Some(255),
                ..self.palette(fill, lit)
            });
        }

        RenderCommand::lit(seg)
    }

    fn full_strip(&self, segment: SegmentCommand) -> RenderCommand {
        let mut seg = Vec::with_capacity(constants::EMPTY_TRAILING_SEGMENTS + 1);
        seg.push(SegmentCommand {
            start: Some(0),
            stop: self.leds,
            ..segment
        });
        seg.extend((0..constants::EMPTY_TRAILING_SEGMENTS).map(|_| SegmentCommand::empty()));
        RenderCommand::lit(seg)
    }

    fn palette(&self, palette: Palette, lit: u32) -> SegmentCommand {
        let unlit = self.leds.saturating_sub(lit);
        let (col, fx, sx, ix) = match palette {
            Palette::PrusaOrange => (
                [
                    Color::Rgb([250, 123, 33]),
                    Color::Rgb([200, 100, 0]),
                    Color::Rgb([0, 0, 0]),
                ],
                46,
                120,
                self.leds / 2,
            ),
            Palette::RedBreath => (
                [
                    Color::Rgbw([255, 0, 0, 0]),
                    Color::Rgbw([220, 60, 60, 0]),
                    Color::Rgbw([255, 120, 150, 0]),
                ],
                2,
                100,
                unlit / 3 + 3,
            ),
            Palette::GreenGradient => (
                [
                    Color::Rgbw([0, 255, 0, 0]),
                    Color::Rgbw([60, 200, 60, 0]),
                    Color::Rgbw([0, 0, 0, 0]),
                ],
                46,
                240,
                lit / 3 + 2,
            ),
            Palette::BlueBreath => (
                [
                    Color::Rgbw([0, 0, 250, 0]),
                    Color::Rgbw([100, 100, 250, 0]),
                    Color::Rgbw([0, 0, 0, 0]),
                ],
                2,
                100,
                unlit / 3 + 3,
            ),
            Palette::RedGradient => (
                [
                    Color::Rgbw([255, 120, 0, 0]),
                    Color::Rgbw([220, 60, 60, 0]),
                    Color::Rgbw([255, 120, 150, 0]),
                ],
                46,
                200,
                lit / 3 + 3,
            ),
        };

        SegmentCommand {
            col: Some(col),
            fx: Some(fx),
            sx: Some(sx),
            ix: Some(ix.min(255) as u8),
            rev: Some(true),
            ..SegmentCommand::empty()
        }
    }
}

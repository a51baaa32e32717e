//! Monochrome OLED status display.
//!
//! [`OledDisplay`] renders frames with the 6×10 ASCII font onto any
//! `embedded-graphics` draw target that can be flushed to the panel. With
//! the `ssd1306` feature, SSD1306 panels in buffered graphics mode
//! implement [`FlushDisplay`] directly.

use crate::display::layout_text;
use embedded_graphics::{
    mono_font::{MonoTextStyle, ascii::FONT_6X10},
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};
use station_hardware::error::{HardwareError, Result};
use station_hardware::traits::StatusDisplay;
use station_hardware::types::DeviceInfo;
use std::fmt;
use tracing::debug;

/// Glyph advance of [`FONT_6X10`].
const GLYPH_WIDTH: u32 = 6;

/// Row pitch of [`FONT_6X10`].
const LINE_HEIGHT: u32 = 10;

/// Panel-side operations a draw target needs beyond drawing.
pub trait FlushDisplay {
    /// Bring the panel up.
    fn init_panel(&mut self) -> Result<()>;

    /// Push the frame buffer to the panel.
    fn flush_panel(&mut self) -> Result<()>;
}

/// Status display on a buffered monochrome panel.
#[derive(Debug)]
pub struct OledDisplay<D> {
    target: D,
    model: String,
}

impl<D> OledDisplay<D>
where
    D: DrawTarget<Color = BinaryColor> + FlushDisplay,
    D::Error: fmt::Debug,
{
    pub fn new(target: D, model: impl Into<String>) -> Self {
        Self {
            target,
            model: model.into(),
        }
    }

    /// Text columns that fit the panel width.
    pub fn columns(&self) -> usize {
        (self.target.bounding_box().size.width / GLYPH_WIDTH) as usize
    }

    /// Text rows that fit the panel height.
    pub fn rows(&self) -> usize {
        (self.target.bounding_box().size.height / LINE_HEIGHT) as usize
    }

    pub fn target(&self) -> &D {
        &self.target
    }

    pub fn into_inner(self) -> D {
        self.target
    }

    fn draw_error(e: D::Error) -> HardwareError {
        HardwareError::display(format!("{e:?}"))
    }
}

impl<D> StatusDisplay for OledDisplay<D>
where
    D: DrawTarget<Color = BinaryColor> + FlushDisplay + Send,
    D::Error: fmt::Debug,
{
    fn init(&mut self) -> Result<()> {
        self.target
            .init_panel()
            .map_err(|e| HardwareError::initialization_failed(format!("SSD1306 allocation failed: {e}")))?;
        self.target.clear(BinaryColor::Off).map_err(Self::draw_error)?;
        self.target.flush_panel()
    }

    fn show(&mut self, text: &str) -> Result<()> {
        let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
        self.target.clear(BinaryColor::Off).map_err(Self::draw_error)?;

        for (row, line) in layout_text(text, self.columns(), self.rows()).iter().enumerate() {
            let y = (row as u32 * LINE_HEIGHT) as i32;
            Text::with_baseline(line, Point::new(0, y), style, Baseline::Top)
                .draw(&mut self.target)
                .map_err(Self::draw_error)?;
        }

        debug!(text, "OLED frame");
        self.target.flush_panel()
    }

    fn device_info(&self) -> DeviceInfo {
        DeviceInfo::new("OLED", self.model.clone())
    }
}

#[cfg(feature = "ssd1306")]
mod panel {
    use super::FlushDisplay;
    use ssd1306::{Ssd1306, mode::BufferedGraphicsMode, prelude::*};
    use station_hardware::error::{HardwareError, Result};

    impl<DI, SIZE> FlushDisplay for Ssd1306<DI, SIZE, BufferedGraphicsMode<SIZE>>
    where
        DI: WriteOnlyDataCommand,
        SIZE: DisplaySize,
    {
        fn init_panel(&mut self) -> Result<()> {
            self.init()
                .map_err(|e| HardwareError::display(format!("{e:?}")))
        }

        fn flush_panel(&mut self) -> Result<()> {
            self.flush()
                .map_err(|e| HardwareError::display(format!("{e:?}")))
        }
    }
}

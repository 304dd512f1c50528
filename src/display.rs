use embedded_graphics::{
    mono_font::{
        MonoTextStyle, MonoTextStyleBuilder,
        ascii::{FONT_6X10, FONT_9X15},
    },
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};
use esp_hal::i2c::master::I2c;
use ssd1306::{I2CDisplayInterface, Ssd1306, mode::BufferedGraphicsMode, prelude::*};

use crate::config::DISPLAY_I2C_ADDRESS;
use crate::error::Error;
use crate::hardware::SSD1306Hardware;
use crate::traits::{Display, TextSize};

type Driver<'a> = Ssd1306<
    I2CInterface<I2c<'a, esp_hal::Blocking>>,
    DisplaySize128x64,
    BufferedGraphicsMode<DisplaySize128x64>,
>;

/// 128×64 SSD1306 OLED in buffered graphics mode.
pub struct Oled<'a> {
    driver: Driver<'a>,
    small: MonoTextStyle<'static, BinaryColor>,
    large: MonoTextStyle<'static, BinaryColor>,
}

impl<'a> Oled<'a> {
    pub fn new(hw: SSD1306Hardware<'a>) -> Self {
        let interface = I2CDisplayInterface::new_custom_address(hw.i2c, DISPLAY_I2C_ADDRESS);
        let driver = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();

        let small = MonoTextStyleBuilder::new()
            .font(&FONT_6X10)
            .text_color(BinaryColor::On)
            .build();
        let large = MonoTextStyleBuilder::new()
            .font(&FONT_9X15)
            .text_color(BinaryColor::On)
            .build();

        Self {
            driver,
            small,
            large,
        }
    }
}

impl Display for Oled<'_> {
    fn init(&mut self) -> Result<(), Error> {
        esp_println::println!("[OLED] Initializing SSD1306 at 0x{:02X}", DISPLAY_I2C_ADDRESS);
        self.driver.init().map_err(|_| Error::Display)
    }

    fn clear(&mut self) -> Result<(), Error> {
        self.driver.clear_buffer();
        Ok(())
    }

    fn draw_text(&mut self, text: &str, x: i32, y: i32, size: TextSize) -> Result<(), Error> {
        let style = match size {
            TextSize::Small => self.small,
            TextSize::Large => self.large,
        };
        Text::with_baseline(text, Point::new(x, y), style, Baseline::Top)
            .draw(&mut self.driver)
            .map_err(|_| Error::Display)?;
        Ok(())
    }

    fn update(&mut self) -> Result<(), Error> {
        self.driver.flush().map_err(|_| Error::Display)
    }
}

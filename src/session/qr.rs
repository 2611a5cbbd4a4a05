//! QR code pairing for linking the bot as a WhatsApp Web device.
//!
//! A pairing attempt issues a short series of codes; the first one stays
//! valid longer than the rest. When the series runs out without a scan,
//! the attempt has timed out.

use std::time::Duration;

use qrcode::render::{svg, unicode};
use qrcode::QrCode;

use crate::session::{LinkedDevice, SessionError};

/// Number of codes issued per pairing attempt.
pub const CODES_PER_ATTEMPT: usize = 6;

/// QR pairing state.
#[derive(Debug)]
pub struct QrPairing {
    codes: Vec<String>,
    current_index: usize,
}

impl QrPairing {
    /// Create a new QR pairing session for a device.
    pub fn new(device: &LinkedDevice) -> Self {
        let codes = (0..CODES_PER_ATTEMPT)
            .map(|_| {
                let reference = format!("{:X}", rand::random::<u64>());
                device.qr_payload(&reference)
            })
            .collect();

        Self {
            codes,
            current_index: 0,
        }
    }

    /// Get the current QR code data.
    pub fn current_code(&self) -> Option<&str> {
        self.codes.get(self.current_index).map(String::as_str)
    }

    /// Advance to the next QR code, `None` once the series is exhausted.
    pub fn next_code(&mut self) -> Option<&str> {
        if self.current_index + 1 < self.codes.len() {
            self.current_index += 1;
            self.current_code()
        } else {
            None
        }
    }

    /// Get timeout for current code.
    pub fn current_timeout(&self) -> Duration {
        if self.current_index == 0 {
            Duration::from_secs(60)
        } else {
            Duration::from_secs(20)
        }
    }
}

/// Render QR code as block characters for terminal display.
pub fn render_terminal(data: &str) -> Result<String, SessionError> {
    let code = QrCode::new(data.as_bytes())
        .map_err(|e| SessionError::QrGeneration(e.to_string()))?;

    Ok(code
        .render::<unicode::Dense1x2>()
        .dark_color(unicode::Dense1x2::Light)
        .light_color(unicode::Dense1x2::Dark)
        .build())
}

/// Render QR code as an SVG document.
pub fn render_svg(data: &str) -> Result<String, SessionError> {
    let code = QrCode::new(data.as_bytes())
        .map_err(|e| SessionError::QrGeneration(e.to_string()))?;

    Ok(code
        .render::<svg::Color<'_>>()
        .min_dimensions(256, 256)
        .build())
}

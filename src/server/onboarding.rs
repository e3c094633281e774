//! Join URL and QR code shown on the dashboard

use qrcode::render::svg;
use qrcode::QrCode;
use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum OnboardingError {
    #[error("failed to encode QR code: {0}")]
    Encode(String),
}

/// What a phone needs to join: the URL and a scannable image of it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnboardingData {
    pub join_url: String,
    /// SVG document
    pub qr_image: Vec<u8>,
}

impl OnboardingData {
    pub fn new(join_url: impl Into<String>, qr_image: Vec<u8>) -> Self {
        Self {
            join_url: join_url.into(),
            qr_image,
        }
    }

    /// Builds the join URL for `host:port` and renders its QR code
    pub fn for_host(host: &str, port: u16) -> Result<Self, OnboardingError> {
        let join_url = join_url(host, port);
        let qr_image = render_qr(&join_url)?;
        Ok(Self { join_url, qr_image })
    }

    /// Like [`OnboardingData::for_host`], but falls back to an empty image
    pub fn for_host_or_plain(host: &str, port: u16) -> Self {
        match Self::for_host(host, port) {
            Ok(data) => data,
            Err(e) => {
                warn!("Onboarding without QR image: {}", e);
                Self::new(join_url(host, port), Vec::new())
            }
        }
    }
}

pub fn join_url(host: &str, port: u16) -> String {
    format!("http://{}:{}", host, port)
}

pub fn render_qr(url: &str) -> Result<Vec<u8>, OnboardingError> {
    let code =
        QrCode::new(url.as_bytes()).map_err(|e| OnboardingError::Encode(e.to_string()))?;
    let image = code
        .render::<svg::Color>()
        .min_dimensions(200, 200)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build();
    Ok(image.into_bytes())
}

/// Address of the interface that routes to the LAN.
///
/// Connecting a UDP socket sends nothing; it only selects the outgoing interface.
pub fn detect_lan_address() -> Option<IpAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket.connect((Ipv4Addr::new(10, 255, 255, 255), 1)).ok()?;
    let address = socket.local_addr().ok()?.ip();
    debug!("Detected LAN address {}", address);
    Some(address)
}

/// Host part of the join URL: explicit override, detected LAN address or loopback
pub fn public_host(configured: Option<&str>) -> String {
    match configured {
        Some(host) if !host.trim().is_empty() => host.trim().to_string(),
        _ => detect_lan_address()
            .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
            .to_string(),
    }
}

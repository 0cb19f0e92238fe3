//! Platform classification from a user agent.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Platform classes with distinct transport policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformClass {
    /// Desktop browsers.
    Desktop,
    /// Mobile browsers other than iOS Safari.
    Mobile,
    /// Safari on iOS/iPadOS, and any iOS browser (all use WebKit).
    IosSafari,
}

impl PlatformClass {
    /// Classify a user agent string.
    ///
    /// iPadOS in desktop mode reports a Macintosh user agent; it is
    /// recognized by the `Mobile/` token Safari still adds.
    pub fn detect(user_agent: &str) -> Self {
        let ua = user_agent.to_ascii_lowercase();

        let ios_device = ua.contains("iphone") || ua.contains("ipad") || ua.contains("ipod");
        let ipad_desktop_mode = ua.contains("macintosh") && ua.contains("mobile/");
        if ios_device || ipad_desktop_mode {
            return Self::IosSafari;
        }

        if ua.contains("android") || ua.contains("mobile") {
            return Self::Mobile;
        }

        Self::Desktop
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Mobile => "mobile",
            Self::IosSafari => "ios_safari",
        }
    }
}

impl fmt::Display for PlatformClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        let cases = [
            (
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Safari/537.36",
                PlatformClass::Desktop,
            ),
            (
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_5) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15",
                PlatformClass::Desktop,
            ),
            (
                "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Mobile Safari/537.36",
                PlatformClass::Mobile,
            ),
            (
                "Mozilla/5.0 (iPhone; CPU iPhone OS 17_5 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Mobile/15E148 Safari/604.1",
                PlatformClass::IosSafari,
            ),
            (
                "Mozilla/5.0 (iPhone; CPU iPhone OS 17_5 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) CriOS/126.0 Mobile/15E148 Safari/604.1",
                PlatformClass::IosSafari,
            ),
            (
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Mobile/15E148 Safari/604.1",
                PlatformClass::IosSafari,
            ),
            ("", PlatformClass::Desktop),
        ];
        for (ua, expected) in cases {
            assert_eq!(PlatformClass::detect(ua), expected, "{ua}");
        }
    }
}

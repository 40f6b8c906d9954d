//! Coarse user-agent classification for the login journal.

/// Device details derived from a user-agent string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceProfile {
    pub device_type: String,
    pub os: String,
    pub browser: String,
    pub platform: String,
}

/// Classify a user agent with lower-cased substring checks.
///
/// Unknown OS and browser values are left empty.
#[must_use]
pub fn parse_user_agent(user_agent: &str) -> DeviceProfile {
    let ua = user_agent.to_lowercase();
    let has = |needle: &str| ua.contains(needle);

    let handheld = has("mobile") || has("android") || has("iphone");

    let device_type = if handheld {
        "mobile"
    } else if has("tablet") || has("ipad") {
        "tablet"
    } else {
        "desktop"
    };

    // android and iOS user agents also mention linux and mac os
    let os = if has("android") {
        "Android"
    } else if has("iphone") || has("ipad") || has("ios") {
        "iOS"
    } else if has("windows") {
        "Windows"
    } else if has("mac") || has("darwin") {
        "macOS"
    } else if has("linux") {
        "Linux"
    } else {
        ""
    };

    let browser = if has("edge") || has("edg/") {
        "Edge"
    } else if has("opera") || has("opr/") {
        "Opera"
    } else if has("chrome") {
        "Chrome"
    } else if has("firefox") {
        "Firefox"
    } else if has("safari") {
        "Safari"
    } else {
        ""
    };

    DeviceProfile {
        device_type: device_type.to_string(),
        os: os.to_string(),
        browser: browser.to_string(),
        platform: if handheld { "mobile" } else { "web" }.to_string(),
    }
}

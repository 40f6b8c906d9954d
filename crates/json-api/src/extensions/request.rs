//! Client metadata from inbound requests.

use salvo::{http::header::USER_AGENT, prelude::Request};
use trusioo_app::auth::ClientMeta;

const FORWARDED_FOR: &str = "x-forwarded-for";
const REAL_IP: &str = "x-real-ip";

pub(crate) trait RequestExt {
    /// Client address and user agent, honouring proxy headers.
    fn client_meta(&self) -> ClientMeta;
}

impl RequestExt for Request {
    fn client_meta(&self) -> ClientMeta {
        let forwarded = self
            .header::<String>(FORWARDED_FOR)
            .and_then(|value| first_forwarded(&value));

        let ip = forwarded
            .or_else(|| {
                self.header::<String>(REAL_IP)
                    .map(|value| value.trim().to_owned())
                    .filter(|value| !value.is_empty())
            })
            .unwrap_or_else(|| remote_ip(self));

        let user_agent = self.header::<String>(USER_AGENT).unwrap_or_default();

        ClientMeta::new(ip, user_agent)
    }
}

fn first_forwarded(value: &str) -> Option<String> {
    value
        .split(',')
        .map(str::trim)
        .find(|hop| !hop.is_empty())
        .map(str::to_owned)
}

fn remote_ip(req: &Request) -> String {
    let addr = req.remote_addr();

    addr.as_ipv4()
        .map(|addr| addr.ip().to_string())
        .or_else(|| addr.as_ipv6().map(|addr| addr.ip().to_string()))
        .unwrap_or_default()
}

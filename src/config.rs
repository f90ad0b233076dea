//! Environment-driven configuration (§6 env vars).

use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::policy::ice_transport_policy::RTCIceTransportPolicy;

const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub production: bool,
    pub turn_url: Option<String>,
    pub turn_username: Option<String>,
    pub turn_password: Option<String>,
}

impl Config {
    /// Read `PORT`, `ENVIRONMENT`, `TURN_URL`, `TURN_USERNAME`, `TURN_PASSWORD`
    /// from the process environment. Missing/unparseable `PORT` falls back to
    /// 8080; any value of `ENVIRONMENT` other than `production` (case
    /// insensitive) is treated as development.
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let production = std::env::var("ENVIRONMENT")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        Self {
            port,
            production,
            turn_url: std::env::var("TURN_URL").ok(),
            turn_username: std::env::var("TURN_USERNAME").ok(),
            turn_password: std::env::var("TURN_PASSWORD").ok(),
        }
    }

    /// Build the ICE configuration used for every new PeerConnection.
    /// Production unconditionally forces `Relay` transport policy (mirrors
    /// the original's hardcoded `ICETransportPolicyRelay`); a TURN server is
    /// pushed onto the ICE server list separately, whenever credentials are
    /// present, regardless of environment.
    pub fn ice_configuration(&self) -> RTCConfiguration {
        let mut servers = vec![RTCIceServer {
            urls: vec!["stun:stun.l.google.com:19302".to_owned()],
            ..Default::default()
        }];

        if let (Some(url), Some(username), Some(password)) =
            (&self.turn_url, &self.turn_username, &self.turn_password)
        {
            servers.push(RTCIceServer {
                urls: vec![url.clone()],
                username: username.clone(),
                credential: password.clone(),
                ..Default::default()
            });
        }

        let ice_transport_policy = if self.production {
            RTCIceTransportPolicy::Relay
        } else {
            RTCIceTransportPolicy::All
        };

        RTCConfiguration {
            ice_servers: servers,
            ice_transport_policy,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ice_configuration_allows_all_candidates() {
        let cfg = Config {
            port: DEFAULT_PORT,
            production: false,
            turn_url: None,
            turn_username: None,
            turn_password: None,
        };
        let ice = cfg.ice_configuration();
        assert_eq!(ice.ice_transport_policy, RTCIceTransportPolicy::All);
        assert_eq!(ice.ice_servers.len(), 1);
    }

    #[test]
    fn production_without_turn_creds_still_forces_relay_policy() {
        let cfg = Config {
            port: DEFAULT_PORT,
            production: true,
            turn_url: None,
            turn_username: None,
            turn_password: None,
        };
        let ice = cfg.ice_configuration();
        assert_eq!(ice.ice_transport_policy, RTCIceTransportPolicy::Relay);
        assert_eq!(ice.ice_servers.len(), 1);
    }

    #[test]
    fn production_with_turn_creds_forces_relay_and_adds_turn_server() {
        let cfg = Config {
            port: DEFAULT_PORT,
            production: true,
            turn_url: Some("turn:turn.example.com:3478".to_owned()),
            turn_username: Some("user".to_owned()),
            turn_password: Some("pass".to_owned()),
        };
        let ice = cfg.ice_configuration();
        assert_eq!(ice.ice_transport_policy, RTCIceTransportPolicy::Relay);
        assert_eq!(ice.ice_servers.len(), 2);
    }

    #[test]
    fn turn_server_is_added_even_outside_production() {
        let cfg = Config {
            port: DEFAULT_PORT,
            production: false,
            turn_url: Some("turn:turn.example.com:3478".to_owned()),
            turn_username: Some("user".to_owned()),
            turn_password: Some("pass".to_owned()),
        };
        let ice = cfg.ice_configuration();
        assert_eq!(ice.ice_transport_policy, RTCIceTransportPolicy::All);
        assert_eq!(ice.ice_servers.len(), 2);
    }
}

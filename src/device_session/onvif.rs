//! ONVIF PTZ device session
//!
//! SOAP-over-HTTP session with WS-Security UsernameToken authentication.
//! Covers the ONVIF PTZ service operations the motion commander issues.

use super::types::{
    DeviceCapabilities, DeviceConnector, DeviceEndpoint, DeviceSession, DeviceStatus,
};
use crate::error::{Error, Result};
use crate::motion_commander::{PtzPosition, PtzVelocity};
use async_trait::async_trait;
use base64::Engine;
use chrono::Utc;
use reqwest::Client;
use sha1::{Digest, Sha1};
use std::time::Duration;

const DEFAULT_PROFILE_TOKEN: &str = "profile_1";

/// ONVIF PTZ session over SOAP
pub struct OnvifSession {
    /// PTZ service endpoint (e.g. http://192.168.x.x:2020/onvif/ptz_service)
    ptz_url: String,
    username: String,
    password: String,
    profile_token: String,
    client: Client,
}

impl OnvifSession {
    pub fn new(endpoint: &DeviceEndpoint) -> Self {
        Self {
            ptz_url: format!(
                "http://{}:{}/onvif/ptz_service",
                endpoint.address, endpoint.port
            ),
            username: endpoint.username.clone(),
            password: endpoint.password.clone(),
            profile_token: DEFAULT_PROFILE_TOKEN.to_string(),
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Override the media profile token when the device does not use the
    /// conventional `profile_1`
    pub fn with_profile_token(mut self, token: impl Into<String>) -> Self {
        self.profile_token = token.into();
        self
    }

    /// WS-Security UsernameToken header.
    /// Password digest = Base64(SHA1(nonce + created + password))
    fn security_header(&self) -> String {
        let nonce: [u8; 16] = rand::random();
        let nonce_base64 = base64::engine::general_purpose::STANDARD.encode(nonce);

        let created = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

        let mut hasher = Sha1::new();
        hasher.update(nonce);
        hasher.update(created.as_bytes());
        hasher.update(self.password.as_bytes());
        let digest = hasher.finalize();
        let digest_base64 = base64::engine::general_purpose::STANDARD.encode(digest);

        format!(
            r#"<s:Header>
    <Security xmlns="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd"
              s:mustUnderstand="true">
      <UsernameToken>
        <Username>{}</Username>
        <Password Type="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-username-token-profile-1.0#PasswordDigest">{}</Password>
        <Nonce EncodingType="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-soap-message-security-1.0#Base64Binary">{}</Nonce>
        <Created xmlns="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd">{}</Created>
      </UsernameToken>
    </Security>
  </s:Header>"#,
            self.username, digest_base64, nonce_base64, created
        )
    }

    fn envelope(&self, body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope"
            xmlns:tptz="http://www.onvif.org/ver20/ptz/wsdl"
            xmlns:tt="http://www.onvif.org/ver10/schema">
  {}
  <s:Body>
    {}
  </s:Body>
</s:Envelope>"#,
            self.security_header(),
            body
        )
    }

    /// Send a SOAP request, returning the response body on success
    async fn send_soap_request(&self, body: &str, action: &str) -> Result<String> {
        tracing::debug!(url = %self.ptz_url, action = %action, "Sending ONVIF PTZ request");

        let response = self
            .client
            .post(&self.ptz_url)
            .header("Content-Type", "application/soap+xml; charset=utf-8")
            .body(self.envelope(body))
            .send()
            .await
            .map_err(|e| Error::Device(format!("PTZ {} request failed: {}", action, e)))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            tracing::error!(status = %status, action = %action, "ONVIF PTZ request failed");
            return Err(Error::Device(format!(
                "ONVIF PTZ {} failed with status {}: {}",
                action, status, text
            )));
        }

        tracing::debug!(action = %action, "ONVIF PTZ command executed");
        Ok(text)
    }
}

/// Pull a float attribute (e.g. `x="0.50"`) out of the first occurrence of
/// `tag` in an XML fragment
fn extract_attr(xml: &str, tag: &str, attr: &str) -> Option<f32> {
    let tag_pos = xml.find(tag)?;
    let rest = &xml[tag_pos..];
    let tag_end = rest.find('>')?;
    let element = &rest[..tag_end];
    let needle = format!("{}=\"", attr);
    let attr_pos = element.find(&needle)? + needle.len();
    let value_end = element[attr_pos..].find('"')?;
    element[attr_pos..attr_pos + value_end].parse().ok()
}

/// Pull the `<tt:Min>`/`<tt:Max>` pair of the first `range_tag` occurring
/// after `section_tag`
fn extract_range(xml: &str, section_tag: &str, range_tag: &str) -> Option<(f32, f32)> {
    let section = &xml[xml.find(section_tag)?..];
    let range = &section[section.find(range_tag)?..];
    let min = extract_text(range, "Min")?;
    let max = extract_text(range, "Max")?;
    Some((min, max))
}

fn extract_text(xml: &str, tag: &str) -> Option<f32> {
    let open = format!("{}>", tag);
    let start = xml.find(&open)? + open.len();
    let end = xml[start..].find('<')?;
    xml[start..start + end].trim().parse().ok()
}

#[async_trait]
impl DeviceSession for OnvifSession {
    async fn capabilities(&self) -> Result<DeviceCapabilities> {
        let body = format!(
            r#"<tptz:GetConfigurationOptions>
      <tptz:ConfigurationToken>{}</tptz:ConfigurationToken>
    </tptz:GetConfigurationOptions>"#,
            self.profile_token
        );

        let response = self
            .send_soap_request(&body, "GetConfigurationOptions")
            .await?;

        let pan_limits = extract_range(&response, "AbsolutePanTiltPositionSpace", "XRange");
        let tilt_limits = extract_range(&response, "AbsolutePanTiltPositionSpace", "YRange");
        let zoom_limits = extract_range(&response, "AbsoluteZoomPositionSpace", "XRange");
        let absolute_move = response.contains("AbsolutePanTiltPositionSpace");

        Ok(DeviceCapabilities {
            pan_limits,
            tilt_limits,
            zoom_limits,
            absolute_move,
            probe_failed: false,
        })
    }

    async fn absolute_move(&self, position: PtzPosition, speed: f32) -> Result<()> {
        let body = format!(
            r#"<tptz:AbsoluteMove>
      <tptz:ProfileToken>{}</tptz:ProfileToken>
      <tptz:Position>
        <tt:PanTilt x="{:.4}" y="{:.4}"/>
        <tt:Zoom x="{:.4}"/>
      </tptz:Position>
      <tptz:Speed>
        <tt:PanTilt x="{:.2}" y="{:.2}"/>
        <tt:Zoom x="{:.2}"/>
      </tptz:Speed>
    </tptz:AbsoluteMove>"#,
            self.profile_token,
            position.pan,
            position.tilt,
            position.zoom,
            speed,
            speed,
            speed * 0.5
        );

        self.send_soap_request(&body, "AbsoluteMove").await?;
        Ok(())
    }

    async fn continuous_move(
        &self,
        velocity: PtzVelocity,
        timeout: Option<Duration>,
    ) -> Result<()> {
        // Device-side auto-stop: ONVIF Timeout element, xs:duration format
        let timeout_element = timeout
            .map(|t| format!("\n      <tptz:Timeout>PT{:.1}S</tptz:Timeout>", t.as_secs_f32()))
            .unwrap_or_default();

        let body = format!(
            r#"<tptz:ContinuousMove>
      <tptz:ProfileToken>{}</tptz:ProfileToken>
      <tptz:Velocity>
        <tt:PanTilt x="{:.2}" y="{:.2}"/>
        <tt:Zoom x="{:.2}"/>
      </tptz:Velocity>{}
    </tptz:ContinuousMove>"#,
            self.profile_token, velocity.pan, velocity.tilt, velocity.zoom, timeout_element
        );

        self.send_soap_request(&body, "ContinuousMove").await?;
        Ok(())
    }

    async fn relative_move(
        &self,
        pan_delta: f32,
        tilt_delta: f32,
        zoom_delta: f32,
        speed: f32,
    ) -> Result<()> {
        let body = format!(
            r#"<tptz:RelativeMove>
      <tptz:ProfileToken>{}</tptz:ProfileToken>
      <tptz:Translation>
        <tt:PanTilt x="{:.4}" y="{:.4}"/>
        <tt:Zoom x="{:.4}"/>
      </tptz:Translation>
      <tptz:Speed>
        <tt:PanTilt x="{:.2}" y="{:.2}"/>
        <tt:Zoom x="{:.2}"/>
      </tptz:Speed>
    </tptz:RelativeMove>"#,
            self.profile_token, pan_delta, tilt_delta, zoom_delta, speed, speed, speed * 0.5
        );

        self.send_soap_request(&body, "RelativeMove").await?;
        Ok(())
    }

    async fn stop(&self, pan_tilt: bool, zoom: bool) -> Result<()> {
        let body = format!(
            r#"<tptz:Stop>
      <tptz:ProfileToken>{}</tptz:ProfileToken>
      <tptz:PanTilt>{}</tptz:PanTilt>
      <tptz:Zoom>{}</tptz:Zoom>
    </tptz:Stop>"#,
            self.profile_token, pan_tilt, zoom
        );

        self.send_soap_request(&body, "Stop").await?;
        Ok(())
    }

    async fn status(&self) -> Result<DeviceStatus> {
        let body = format!(
            r#"<tptz:GetStatus>
      <tptz:ProfileToken>{}</tptz:ProfileToken>
    </tptz:GetStatus>"#,
            self.profile_token
        );

        let response = self.send_soap_request(&body, "GetStatus").await?;

        let pan = extract_attr(&response, "PanTilt", "x");
        let tilt = extract_attr(&response, "PanTilt", "y");
        let zoom = extract_attr(&response, "Zoom", "x");

        let position = match (pan, tilt) {
            (Some(pan), Some(tilt)) => {
                Some(PtzPosition::new(pan, tilt, zoom.unwrap_or(0.0)))
            }
            _ => None,
        };

        let moving = response.contains("MOVING");
        let utc_time = response.contains("UtcDateTime").then(Utc::now);

        Ok(DeviceStatus {
            position,
            moving,
            utc_time,
        })
    }

    async fn goto_preset(&self, token: &str, speed: Option<f32>) -> Result<()> {
        let speed_element = speed
            .map(|s| {
                format!(
                    "\n      <tptz:Speed>\n        <tt:PanTilt x=\"{:.2}\" y=\"{:.2}\"/>\n      </tptz:Speed>",
                    s, s
                )
            })
            .unwrap_or_default();

        let body = format!(
            r#"<tptz:GotoPreset>
      <tptz:ProfileToken>{}</tptz:ProfileToken>
      <tptz:PresetToken>{}</tptz:PresetToken>{}
    </tptz:GotoPreset>"#,
            self.profile_token, token, speed_element
        );

        self.send_soap_request(&body, "GotoPreset").await?;
        Ok(())
    }

    async fn set_preset(&self, token: &str, name: Option<&str>) -> Result<()> {
        let name_element = name
            .map(|n| format!("\n      <tptz:PresetName>{}</tptz:PresetName>", n))
            .unwrap_or_default();

        let body = format!(
            r#"<tptz:SetPreset>
      <tptz:ProfileToken>{}</tptz:ProfileToken>{}
      <tptz:PresetToken>{}</tptz:PresetToken>
    </tptz:SetPreset>"#,
            self.profile_token, name_element, token
        );

        self.send_soap_request(&body, "SetPreset").await?;
        Ok(())
    }

    async fn remove_preset(&self, token: &str) -> Result<()> {
        let body = format!(
            r#"<tptz:RemovePreset>
      <tptz:ProfileToken>{}</tptz:ProfileToken>
      <tptz:PresetToken>{}</tptz:PresetToken>
    </tptz:RemovePreset>"#,
            self.profile_token, token
        );

        self.send_soap_request(&body, "RemovePreset").await?;
        Ok(())
    }
}

/// Opens ONVIF sessions, validating reachability with an initial GetStatus
pub struct OnvifConnector;

#[async_trait]
impl DeviceConnector for OnvifConnector {
    async fn open(&self, endpoint: &DeviceEndpoint) -> Result<Box<dyn DeviceSession>> {
        let session = OnvifSession::new(endpoint);

        // A failed status query here means the endpoint is unreachable or
        // the credentials were rejected; surface it as a connection failure.
        session.status().await.map_err(|e| {
            Error::Connection(format!(
                "ONVIF session to {}:{} failed: {}",
                endpoint.address, endpoint.port, e
            ))
        })?;

        tracing::info!(
            address = %endpoint.address,
            port = %endpoint.port,
            "ONVIF session established"
        );

        Ok(Box::new(session))
    }
}

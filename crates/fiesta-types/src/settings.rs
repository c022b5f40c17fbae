//! The site-wide settings document: a single row (id 1) of scalar fields
//! plus JSON sub-documents for the navbar, footer, countdown banner, and
//! website metadata. Partial updates shallow-merge over the stored row;
//! sub-documents are replaced wholesale, never deep-merged, so clients
//! must always submit complete sub-objects.

use serde::{Deserialize, Serialize};

pub const SETTINGS_ROW_ID: i64 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialLinks {
    pub facebook: String,
    pub twitter: String,
    pub instagram: String,
    pub youtube: String,
}

impl Default for SocialLinks {
    fn default() -> Self {
        SocialLinks {
            facebook: "#".into(),
            twitter: "#".into(),
            instagram: "#".into(),
            youtube: "#".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

impl Default for ContactInfo {
    fn default() -> Self {
        ContactInfo {
            email: "info@sciencecarnival.edu".into(),
            phone: "(123) 456-7890".into(),
            address: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteSettings {
    pub title: String,
    pub description: String,
    pub favicon: String,
    /// Raw HTML injected into `<head>` of every public page.
    pub header_code: String,
    /// Raw HTML injected before `</body>` of every public page.
    pub footer_code: String,
}

impl Default for WebsiteSettings {
    fn default() -> Self {
        WebsiteSettings {
            title: "TGBHS SCIENCE FIESTA".into(),
            description: "Explore the wonders of science at our annual TGBHS SCIENCE FIESTA"
                .into(),
            favicon: String::new(),
            header_code: String::new(),
            footer_code: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayMode {
    #[serde(rename = "logo-only")]
    LogoOnly,
    #[serde(rename = "logo-text")]
    LogoText,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavbarSettings {
    pub logo: String,
    pub logo_text: String,
    pub site_title: String,
    pub primary_color: String,
    pub registration_link: String,
    pub display_mode: DisplayMode,
}

impl Default for NavbarSettings {
    fn default() -> Self {
        NavbarSettings {
            logo: String::new(),
            logo_text: "SF".into(),
            site_title: "SCIENCE FIESTA".into(),
            primary_color: "#3b82f6".into(),
            registration_link: "https://example.com/register".into(),
            display_mode: DisplayMode::LogoText,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FooterSettings {
    pub logo_text: String,
    pub tagline: String,
    pub description: String,
    pub privacy_policy_link: String,
    pub terms_link: String,
    pub copyright_text: String,
}

impl Default for FooterSettings {
    fn default() -> Self {
        FooterSettings {
            logo_text: "Science Carnival".into(),
            tagline: "Explore, Discover, Innovate".into(),
            description:
                "Join us for an unforgettable celebration of science, technology, and innovation."
                    .into(),
            privacy_policy_link: "#".into(),
            terms_link: "#".into(),
            copyright_text: "© Science Carnival. All rights reserved.".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountdownSettings {
    pub enabled: bool,
    pub title: String,
    pub subtitle: String,
    pub button_text: String,
    pub button_link: String,
    pub background_color: String,
    pub text_color: String,
}

impl Default for CountdownSettings {
    fn default() -> Self {
        CountdownSettings {
            enabled: true,
            title: "The Science Carnival is coming!".into(),
            subtitle: "Join us for a day of discovery and innovation".into(),
            button_text: "Register Now".into(),
            button_link: "https://example.com/register".into(),
            background_color: "#0f172a".into(),
            text_color: "#ffffff".into(),
        }
    }
}

/// The singleton settings row. `Default` yields the fully-initialized
/// document with id [`SETTINGS_ROW_ID`] that a fresh store is seeded with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub id: i64,
    /// ISO datetime of the event the public countdown targets.
    pub carnival_date: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub social_facebook: String,
    pub social_twitter: String,
    pub social_instagram: String,
    pub social_youtube: String,
    /// Recipient of contact-form submissions.
    pub contact_mail: String,
    pub social_links: SocialLinks,
    pub contact_info: ContactInfo,
    pub website_settings: WebsiteSettings,
    pub navbar_settings: NavbarSettings,
    pub footer_settings: FooterSettings,
    pub countdown_settings: CountdownSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            id: SETTINGS_ROW_ID,
            carnival_date: "2023-09-15T00:00:00.000Z".into(),
            contact_email: "info@sciencecarnival.edu".into(),
            contact_phone: "(123) 456-7890".into(),
            social_facebook: "#".into(),
            social_twitter: "#".into(),
            social_instagram: "#".into(),
            social_youtube: "#".into(),
            contact_mail: "contact@sciencecarnival.edu".into(),
            social_links: SocialLinks::default(),
            contact_info: ContactInfo::default(),
            website_settings: WebsiteSettings::default(),
            navbar_settings: NavbarSettings::default(),
            footer_settings: FooterSettings::default(),
            countdown_settings: CountdownSettings::default(),
        }
    }
}

/// Partial settings update. Every field is optional; supplied scalars
/// replace the stored value and supplied sub-documents replace the stored
/// sub-document in full.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub carnival_date: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub social_facebook: Option<String>,
    pub social_twitter: Option<String>,
    pub social_instagram: Option<String>,
    pub social_youtube: Option<String>,
    pub contact_mail: Option<String>,
    pub social_links: Option<SocialLinks>,
    pub contact_info: Option<ContactInfo>,
    pub website_settings: Option<WebsiteSettings>,
    pub navbar_settings: Option<NavbarSettings>,
    pub footer_settings: Option<FooterSettings>,
    pub countdown_settings: Option<CountdownSettings>,
}

impl Settings {
    /// Shallow-merge `patch` over this document. The row id is never
    /// patchable.
    pub fn apply(&mut self, patch: SettingsPatch) {
        let SettingsPatch {
            carnival_date,
            contact_email,
            contact_phone,
            social_facebook,
            social_twitter,
            social_instagram,
            social_youtube,
            contact_mail,
            social_links,
            contact_info,
            website_settings,
            navbar_settings,
            footer_settings,
            countdown_settings,
        } = patch;

        if let Some(v) = carnival_date {
            self.carnival_date = v;
        }
        if let Some(v) = contact_email {
            self.contact_email = v;
        }
        if let Some(v) = contact_phone {
            self.contact_phone = v;
        }
        if let Some(v) = social_facebook {
            self.social_facebook = v;
        }
        if let Some(v) = social_twitter {
            self.social_twitter = v;
        }
        if let Some(v) = social_instagram {
            self.social_instagram = v;
        }
        if let Some(v) = social_youtube {
            self.social_youtube = v;
        }
        if let Some(v) = contact_mail {
            self.contact_mail = v;
        }
        if let Some(v) = social_links {
            self.social_links = v;
        }
        if let Some(v) = contact_info {
            self.contact_info = v;
        }
        if let Some(v) = website_settings {
            self.website_settings = v;
        }
        if let Some(v) = navbar_settings {
            self.navbar_settings = v;
        }
        if let Some(v) = footer_settings {
            self.footer_settings = v;
        }
        if let Some(v) = countdown_settings {
            self.countdown_settings = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_patch() -> SettingsPatch {
        SettingsPatch {
            carnival_date: Some("2026-09-15T00:00:00.000Z".into()),
            contact_email: Some("fair@school.edu".into()),
            navbar_settings: Some(NavbarSettings {
                logo: "/logo.png".into(),
                logo_text: "SC".into(),
                site_title: "Science Week".into(),
                primary_color: "#16a34a".into(),
                registration_link: "https://school.edu/register".into(),
                display_mode: DisplayMode::LogoOnly,
            }),
            ..SettingsPatch::default()
        }
    }

    #[test]
    fn apply_replaces_only_supplied_fields() {
        let mut settings = Settings::default();
        settings.apply(sample_patch());

        assert_eq!(settings.carnival_date, "2026-09-15T00:00:00.000Z");
        assert_eq!(settings.contact_email, "fair@school.edu");
        // Untouched fields keep their defaults.
        assert_eq!(settings.contact_phone, "(123) 456-7890");
        assert_eq!(settings.footer_settings, FooterSettings::default());
        assert_eq!(settings.id, SETTINGS_ROW_ID);
    }

    #[test]
    fn sub_documents_are_replaced_wholesale() {
        let mut settings = Settings::default();
        settings.apply(sample_patch());

        let navbar = &settings.navbar_settings;
        assert_eq!(navbar.site_title, "Science Week");
        assert_eq!(navbar.display_mode, DisplayMode::LogoOnly);
        // The default registration link must not survive inside a replaced
        // sub-document.
        assert_eq!(navbar.registration_link, "https://school.edu/register");
    }

    #[test]
    fn apply_is_idempotent() {
        let mut once = Settings::default();
        once.apply(sample_patch());

        let mut twice = Settings::default();
        twice.apply(sample_patch());
        twice.apply(sample_patch());

        assert_eq!(once, twice);
    }

    #[test]
    fn patch_deserializes_from_partial_json() {
        let patch: SettingsPatch = serde_json::from_str(
            r##"{"carnivalDate": "2026-01-01T00:00:00.000Z",
                "countdownSettings": {
                    "enabled": false,
                    "title": "See you next year",
                    "subtitle": "",
                    "buttonText": "Home",
                    "buttonLink": "/",
                    "backgroundColor": "#000000",
                    "textColor": "#ffffff"
                }}"##,
        )
        .unwrap();

        assert_eq!(patch.carnival_date.as_deref(), Some("2026-01-01T00:00:00.000Z"));
        assert!(patch.navbar_settings.is_none());
        assert_eq!(patch.countdown_settings.unwrap().enabled, false);
    }

    #[test]
    fn display_mode_uses_kebab_case_on_the_wire() {
        let json = serde_json::to_string(&DisplayMode::LogoOnly).unwrap();
        assert_eq!(json, "\"logo-only\"");
        let parsed: DisplayMode = serde_json::from_str("\"logo-text\"").unwrap();
        assert_eq!(parsed, DisplayMode::LogoText);
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomepageStat {
    pub value: String,
    pub label: String,
    pub icon: String,
}

/// Landing page hero plus the featured-livestock section header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HomepageContent {
    pub badge: String,
    pub main_title: String,
    pub rotating_texts: Vec<String>,
    pub description: String,
    pub tour_video_url: String,
    pub livestock_badge: String,
    pub livestock_title: String,
    pub livestock_desc: String,
    pub stats: Vec<HomepageStat>,
    pub grid_images: Vec<String>,
}

impl Default for HomepageContent {
    fn default() -> Self {
        let stat = |value: &str, label: &str, icon: &str| HomepageStat {
            value: value.to_string(),
            label: label.to_string(),
            icon: icon.to_string(),
        };
        Self {
            badge: "🎯 Trusted Since 1995".to_string(),
            main_title: "FarmFresh".to_string(),
            rotating_texts: ["Premium Quality", "Ethically Raised", "Sustainable Farming", "Natural Diet"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            description: "Experience the difference of animals raised with care, compassion, and \
                          sustainable practices. Your trusted source for premium livestock."
                .to_string(),
            tour_video_url: String::new(),
            livestock_badge: "🐖 Our Premium Livestock".to_string(),
            livestock_title: "Quality Animals, Ethical Farming".to_string(),
            livestock_desc: "Each animal is raised with care, ensuring they live healthy, \
                             stress-free lives in natural environments."
                .to_string(),
            stats: vec![
                stat("25+", "Years", "🏆"),
                stat("10K+", "Animals", "🐄"),
                stat("100%", "Natural", "🌿"),
            ],
            grid_images: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueCard {
    pub icon: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub year: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AboutStat {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AboutContent {
    pub hero_title: String,
    pub hero_subtitle: String,
    pub hero_description: String,
    pub mission: String,
    pub vision: String,
    pub ceo_name: String,
    pub ceo_title: String,
    pub ceo_image: String,
    pub ceo_quote: String,
    pub ceo_bio: String,
    pub values: Vec<ValueCard>,
    pub milestones: Vec<Milestone>,
    pub team_image: String,
    pub stats: Vec<AboutStat>,
}

impl Default for AboutContent {
    fn default() -> Self {
        let value = |icon: &str, title: &str, description: &str| ValueCard {
            icon: icon.to_string(),
            title: title.to_string(),
            description: description.to_string(),
        };
        let milestone = |year: &str, title: &str, description: &str| Milestone {
            year: year.to_string(),
            title: title.to_string(),
            description: description.to_string(),
        };
        let stat = |value: &str, label: &str| AboutStat {
            value: value.to_string(),
            label: label.to_string(),
        };
        Self {
            hero_title: "Our Story of Passion & Purpose".to_string(),
            hero_subtitle: "Where Tradition Meets Innovation in Modern Farming".to_string(),
            hero_description: "For over 25 years, we have been dedicated to redefining excellence \
                               in livestock farming..."
                .to_string(),
            mission: "To revolutionize livestock farming...".to_string(),
            vision: "A world where every animal is raised with dignity...".to_string(),
            ceo_name: String::new(),
            ceo_title: "Founder & Chief Executive Officer".to_string(),
            ceo_image: String::new(),
            ceo_quote: "True farming is not just a business...".to_string(),
            ceo_bio: String::new(),
            values: vec![
                value("🌱", "Sustainability", "Regenerative practices"),
                value("❤️", "Animal Welfare", "Stress-free environments"),
                value("🤝", "Community", "Empowering local farmers"),
                value("🔬", "Innovation", "Research driven"),
            ],
            milestones: vec![
                milestone("1995", "Humble Beginnings", "Started with just 5 acres"),
                milestone("2005", "Expansion", "Grew to 500-acre farm"),
                milestone("2015", "Certification", "Organic certified"),
                milestone("2023", "Global Reach", "Serving 3 continents"),
            ],
            team_image: String::new(),
            stats: vec![
                stat("25+", "Years Experience"),
                stat("5000+", "Happy Clients"),
                stat("100%", "Natural Feed"),
                stat("50+", "Team Members"),
            ],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LegalContent {
    pub terms: String,
    pub privacy: String,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Business contact card. `phone_number` is the WhatsApp line orders are handed off to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactSettings {
    pub phone_number: String,
    pub public_display_phone: String,
    pub email: String,
    pub address: String,
    pub boiler_message: String,
    pub facebook: String,
    pub instagram: String,
    pub twitter: String,
    pub youtube: String,
    pub tiktok: String,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for ContactSettings {
    fn default() -> Self {
        Self {
            phone_number: String::new(),
            public_display_phone: String::new(),
            email: "sales@farmlivestock.com".to_string(),
            address: String::new(),
            boiler_message: String::new(),
            facebook: String::new(),
            instagram: String::new(),
            twitter: String::new(),
            youtube: String::new(),
            tiktok: String::new(),
            updated_at: None,
        }
    }
}

/// Partial contact update; `None` leaves the stored field alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactUpdate {
    pub phone_number: Option<String>,
    pub public_display_phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub boiler_message: Option<String>,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub twitter: Option<String>,
    pub youtube: Option<String>,
    pub tiktok: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LivestockPageHeader {
    pub title: String,
    pub subtitle: String,
    pub hero_image: String,
}

/// Fixed contract with the target site plus page geometry.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub base_url: String,
    pub default_manga: String,
    pub chapter_link_selector: String,
    pub page_image_selector: String,
    pub alternate_server_selector: String,
    pub referer: String,
    pub page_width: u32,
    pub page_height: u32,
    pub margin: u32,
    pub max_fetch_retries: usize,
    pub jpeg_quality: u8,
    pub window_size: (u32, u32),
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://manganelo.com/manga/".to_string(),
            default_manga: "tales_of_demons_and_gods".to_string(),
            chapter_link_selector: ".chapter-list .row > span > a".to_string(),
            page_image_selector: "#vungdoc > img".to_string(),
            alternate_server_selector: ".options-chapter .pn-option > a:not(.isactive)".to_string(),
            referer: "https://manganelo.com/".to_string(),
            page_width: 575,
            page_height: 821,
            margin: 5,
            max_fetch_retries: 3,
            jpeg_quality: 90,
            window_size: (1280, 1024),
        }
    }
}

impl SiteConfig {
    pub fn manga_url(&self, manga: &str) -> String {
        format!("{}{}", self.base_url, manga)
    }
}

use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VendorContext {
    Azure,
    OpenAi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    Landscape1792x1024,
    Landscape1536x1024,
}

impl ImageSize {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Landscape1792x1024 => "1792x1024",
            Self::Landscape1536x1024 => "1536x1024",
        }
    }
}

/// `Default` leaves the choice to the vendor and is never sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageQuality {
    Default,
    Standard,
    Medium,
    High,
}

impl ImageQuality {
    pub fn wire_value(self) -> Option<&'static str> {
        match self {
            Self::Default => None,
            Self::Standard => Some("standard"),
            Self::Medium => Some("medium"),
            Self::High => Some("high"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageStyle {
    Vivid,
    Natural,
}

impl ImageStyle {
    pub fn wire_value(self) -> &'static str {
        match self {
            Self::Vivid => "vivid",
            Self::Natural => "natural",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Url,
    Bytes,
}

impl ResponseFormat {
    pub fn wire_value(self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::Bytes => "b64_json",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelOptions {
    pub size: ImageSize,
    pub quality: ImageQuality,
    pub style: Option<ImageStyle>,
    pub response_format: Option<ResponseFormat>,
}

#[derive(Debug, Clone, Copy)]
struct CatalogEntry {
    azure: ModelOptions,
    openai: ModelOptions,
}

/// Fixed generation parameters per model type, split by vendor.
#[derive(Debug, Clone)]
pub struct ModelOptionsCatalog {
    entries: IndexMap<String, CatalogEntry>,
}

impl Default for ModelOptionsCatalog {
    fn default() -> Self {
        Self {
            entries: default_entries(),
        }
    }
}

impl ModelOptionsCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, model_type: &str, vendor: VendorContext) -> Option<ModelOptions> {
        let entry = self.entries.get(model_type.trim())?;
        Some(match vendor {
            VendorContext::Azure => entry.azure,
            VendorContext::OpenAi => entry.openai,
        })
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

fn default_entries() -> IndexMap<String, CatalogEntry> {
    let mut map = IndexMap::new();

    let mut insert = |name: &str, azure: ModelOptions, openai: ModelOptions| {
        map.insert(name.to_string(), CatalogEntry { azure, openai });
    };

    let dalle = ModelOptions {
        size: ImageSize::Landscape1792x1024,
        quality: ImageQuality::Standard,
        style: Some(ImageStyle::Vivid),
        response_format: Some(ResponseFormat::Url),
    };
    insert("dall-e-3", dalle, dalle);

    let gpt_image = |quality: ImageQuality, response_format: Option<ResponseFormat>| ModelOptions {
        size: ImageSize::Landscape1536x1024,
        quality,
        style: None,
        response_format,
    };
    insert(
        "gpt-image-1",
        gpt_image(ImageQuality::High, Some(ResponseFormat::Bytes)),
        gpt_image(ImageQuality::Default, None),
    );
    insert(
        "gpt-image-1-mini",
        gpt_image(ImageQuality::Medium, Some(ResponseFormat::Bytes)),
        gpt_image(ImageQuality::Medium, None),
    );
    insert(
        "gpt-image-1.5",
        gpt_image(ImageQuality::Default, Some(ResponseFormat::Bytes)),
        gpt_image(ImageQuality::Default, None),
    );

    map
}

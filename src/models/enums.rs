use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(OfferStatus {
    Analyzed => "analyzed",
});

str_enum!(OfferInputType {
    RawText => "raw_text",
    Url => "url",
    Document => "document",
});

str_enum!(MarketSophistication {
    Unaware => "unaware",
    ProblemAware => "problem_aware",
    SolutionAware => "solution_aware",
    ProductAware => "product_aware",
    MostAware => "most_aware",
});

str_enum!(FunnelFlow {
    LeadMagnetSales => "lead_magnet_sales",
    DirectSales => "direct_sales",
    Webinar => "webinar",
    Application => "application",
});

impl Default for MarketSophistication {
    fn default() -> Self {
        Self::ProblemAware
    }
}

impl Default for FunnelFlow {
    fn default() -> Self {
        Self::DirectSales
    }
}

str_enum!(FunnelStatus {
    Draft => "draft",
    Published => "published",
});

str_enum!(FunnelPageType {
    Lead => "lead",
    Sales => "sales",
    Upsell => "upsell",
    ThankYou => "thank_you",
});

str_enum!(BlockType {
    Hero => "hero",
    Features => "features",
    Pricing => "pricing",
    Testimonials => "testimonials",
    Cta => "cta",
    Faq => "faq",
    Header => "header",
    Footer => "footer",
});

str_enum!(ExtractionStatus {
    Pending => "pending",
    Processing => "processing",
    Complete => "complete",
    Failed => "failed",
});

str_enum!(ReportStatus {
    Draft => "draft",
    Generating => "generating",
    Complete => "complete",
    Archived => "archived",
});

str_enum!(SectionStatus {
    Complete => "complete",
    Pending => "pending",
});

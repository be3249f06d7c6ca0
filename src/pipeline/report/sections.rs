//! The fixed, ordered list of report sections and their static metadata.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ReportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSection {
    Positioning,
    RevenueModel,
    TargetPersona,
    PainPoints,
    ConversionHooks,
    FunnelStructure,
    PricingStrategy,
    UpsellDownsell,
    StrategicBonuses,
    MessagingAngles,
    FunnelHealth,
    MonetizationNarrative,
    UseCases,
    ValuePerception,
}

/// Static description of one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionMetadata {
    pub title: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
    pub prompt: &'static str,
}

impl ReportSection {
    /// Declared order. Reports always render in this order.
    pub const ALL: [ReportSection; 14] = [
        ReportSection::Positioning,
        ReportSection::RevenueModel,
        ReportSection::TargetPersona,
        ReportSection::PainPoints,
        ReportSection::ConversionHooks,
        ReportSection::FunnelStructure,
        ReportSection::PricingStrategy,
        ReportSection::UpsellDownsell,
        ReportSection::StrategicBonuses,
        ReportSection::MessagingAngles,
        ReportSection::FunnelHealth,
        ReportSection::MonetizationNarrative,
        ReportSection::UseCases,
        ReportSection::ValuePerception,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positioning => "positioning",
            Self::RevenueModel => "revenue_model",
            Self::TargetPersona => "target_persona",
            Self::PainPoints => "pain_points",
            Self::ConversionHooks => "conversion_hooks",
            Self::FunnelStructure => "funnel_structure",
            Self::PricingStrategy => "pricing_strategy",
            Self::UpsellDownsell => "upsell_downsell",
            Self::StrategicBonuses => "strategic_bonuses",
            Self::MessagingAngles => "messaging_angles",
            Self::FunnelHealth => "funnel_health",
            Self::MonetizationNarrative => "monetization_narrative",
            Self::UseCases => "use_cases",
            Self::ValuePerception => "value_perception",
        }
    }

    /// Markdown heading line for this section, as rendered in a report.
    pub fn heading(&self) -> String {
        let meta = self.metadata();
        format!("## {} {}", meta.icon, meta.title)
    }

    pub fn metadata(&self) -> SectionMetadata {
        match self {
            Self::Positioning => SectionMetadata {
                title: "Offer Positioning Analysis",
                icon: "📊",
                description: "How your offer should be positioned in the market to own a category instead of competing in one",
                prompt: "Provide a concise, high-impact analysis of the market positioning for this offer. Give strategic recommendations for category ownership.",
            },
            Self::RevenueModel => SectionMetadata {
                title: "Revenue Model Architecture",
                icon: "💰",
                description: "The exact pricing structure, payment options, and monetization model your offer requires",
                prompt: "Provide a extremely concise, structured outline of the optimal revenue model including pricing structure and payment options.",
            },
            Self::TargetPersona => SectionMetadata {
                title: "Target Persona Intelligence",
                icon: "🎯",
                description: "Deep persona analysis: demographics, psychographics, buying behavior, decision triggers",
                prompt: "Provide a structured, bulleted breakdown of the target persona including demographics, psychographics, and decision triggers. Make it concise.",
            },
            Self::PainPoints => SectionMetadata {
                title: "Pain Point Mapping",
                icon: "🔥",
                description: "The real friction points your persona experiences (not surface-level complaints)",
                prompt: "Map the deep pain points and friction your target persona experiences. Use bullet points and keep analysis brief and impactful.",
            },
            Self::ConversionHooks => SectionMetadata {
                title: "Conversion Hook Library",
                icon: "🧲",
                description: "Specific hooks engineered to eliminate buying resistance for THIS offer",
                prompt: "Generate 3-5 specific conversion hooks engineered to eliminate buying resistance for this offer. Keep it highly concise.",
            },
            Self::FunnelStructure => SectionMetadata {
                title: "Funnel Structure Blueprint",
                icon: "📈",
                description: "The exact funnel flow optimized for your offer's economics (not generic templates)",
                prompt: "Design a highly concise, step-by-step funnel structure and flow optimized for this specific offer. Avoid fluff.",
            },
            Self::PricingStrategy => SectionMetadata {
                title: "Pricing Strategy",
                icon: "💎",
                description: "Recommended price points, payment plans, and anchoring tactics",
                prompt: "Outline a brief, structured pricing strategy including price points and anchoring tactics. Be explicit and concise.",
            },
            Self::UpsellDownsell => SectionMetadata {
                title: "Upsell/Downsell Paths",
                icon: "🚀",
                description: "Natural revenue expansion paths that increase LTV without friction",
                prompt: "Provide a highly concise map of upsell and downsell paths to maximize lifetime value.",
            },
            Self::StrategicBonuses => SectionMetadata {
                title: "Strategic Bonus Recommendations",
                icon: "🎁",
                description: "Bonuses designed to increase perceived value and eliminate objections",
                prompt: "Recommend 2-4 strategic bonuses that increase value and eliminate objections. Be concise.",
            },
            Self::MessagingAngles => SectionMetadata {
                title: "Messaging Angle Matrix",
                icon: "✍️",
                description: "The exact angles to lead with based on persona psychology",
                prompt: "Create a highly concise, bulleted messaging angle matrix based on target persona psychology.",
            },
            Self::FunnelHealth => SectionMetadata {
                title: "Funnel Health Score",
                icon: "📉",
                description: "Predicted conversion performance and revenue leakage points",
                prompt: "Provide a concise assessment of predicted funnel health and identify 1-3 specific potential leakage points.",
            },
            Self::MonetizationNarrative => SectionMetadata {
                title: "Monetization Strategy Narrative",
                icon: "🧠",
                description: "Strategic reasoning behind every recommendation",
                prompt: "Provide a concise, 1-2 paragraph strategic narrative detailing the reasoning behind your core recommendations.",
            },
            Self::UseCases => SectionMetadata {
                title: "Real-World Use Case Scenarios",
                icon: "🏆",
                description: "How operators in your vertical would deploy this exact offer",
                prompt: "Briefly describe 2-3 specific real-world use case scenarios for deploying this offer. Keep descriptions short and punchy.",
            },
            Self::ValuePerception => SectionMetadata {
                title: "Product Core Value Perception",
                icon: "💡",
                description: "How your market perceives value and how to reframe it for maximum willingness to pay",
                prompt: "Analyze how the market perceives value and provide 1-2 concise reframing strategies to maximize willingness to pay.",
            },
        }
    }
}

impl FromStr for ReportSection {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|section| section.as_str() == s)
            .ok_or_else(|| ReportError::UnknownSection(s.to_string()))
    }
}

impl std::fmt::Display for ReportSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

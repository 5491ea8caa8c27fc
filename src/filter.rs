use crate::{CompiledShader, CompiledShaderVariant, HardwareTier};

/// Selects the variants of a single hardware tier which carry all requested keywords
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct VariantFilter {
    pub tier: HardwareTier,

    /// Each entry must equal, ignoring case, one of the variant's keywords, its light mode
    /// or its pass name. Empty matches everything.
    pub search_keywords: Vec<String>,
}

impl VariantFilter {
    pub fn new(tier: HardwareTier) -> Self {
        Self {
            tier,
            search_keywords: Vec::new(),
        }
    }

    /// Filter with a space-separated search string, as typed into a search box.
    pub fn with_search(tier: HardwareTier, search: &str) -> Self {
        Self {
            tier,
            search_keywords: search.split_whitespace().map(str::to_owned).collect(),
        }
    }

    pub fn matches(&self, variant: &CompiledShaderVariant) -> bool {
        // Tiers are not hierarchical.
        if variant.hardware_tier != self.tier {
            return false;
        }

        self.search_keywords.iter().all(|search| {
            let eq = |s: &str| s.to_lowercase() == search.to_lowercase();

            variant.keywords.iter().any(|k| eq(k.as_str()))
                || variant.light_mode.as_deref().map_or(false, eq)
                || variant.pass_name.as_deref().map_or(false, eq)
        })
    }
}

impl CompiledShader {
    /// Variants passing `filter`, along with their index in `variants`
    pub fn visible_variants<'a>(
        &'a self,
        filter: &'a VariantFilter,
    ) -> impl Iterator<Item = (usize, &'a CompiledShaderVariant)> + 'a {
        self.variants
            .iter()
            .enumerate()
            .filter(move |(_, variant)| filter.matches(variant))
    }
}

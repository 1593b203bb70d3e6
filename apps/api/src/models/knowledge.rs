use serde::{Deserialize, Deserializer, Serialize};

/// The three products the advisor sells, in their canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductKey {
    #[serde(rename = "danaPlus")]
    DanaPlus,
    #[serde(rename = "reksadana")]
    Reksadana,
    #[serde(rename = "eMAS")]
    Emas,
}

impl ProductKey {
    pub const ALL: [ProductKey; 3] = [ProductKey::DanaPlus, ProductKey::Reksadana, ProductKey::Emas];

    /// Display label used in prompts and product recommendations.
    pub fn label(self) -> &'static str {
        match self {
            ProductKey::DanaPlus => "DANA+",
            ProductKey::Reksadana => "Reksadana",
            ProductKey::Emas => "eMAS",
        }
    }

    /// Parses the key used in URLs and JSON (`danaPlus`, `reksadana`, `eMAS`).
    /// Matching is case-insensitive.
    pub fn from_key(key: &str) -> Option<ProductKey> {
        ProductKey::ALL
            .into_iter()
            .find(|p| p.key().eq_ignore_ascii_case(key))
    }

    pub fn key(self) -> &'static str {
        match self {
            ProductKey::DanaPlus => "danaPlus",
            ProductKey::Reksadana => "reksadana",
            ProductKey::Emas => "eMAS",
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Descriptive record for one product. Every field is a string; unset is "".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInfo {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub features: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub benefits: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub target_audience: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub risk_level: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub minimum_investment: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub return_rate: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub additional_info: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub faqs: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub historical_performance: String,
}

impl ProductInfo {
    /// Labelled descriptive fields in prompt order. `name` is not included.
    pub fn fields(&self) -> [(&'static str, &str); 10] {
        [
            ("Description", self.description.as_str()),
            ("Features", self.features.as_str()),
            ("Benefits", self.benefits.as_str()),
            ("Target Audience", self.target_audience.as_str()),
            ("Risk Level", self.risk_level.as_str()),
            ("Minimum Investment", self.minimum_investment.as_str()),
            ("Return Rate", self.return_rate.as_str()),
            ("Additional Info", self.additional_info.as_str()),
            ("FAQs", self.faqs.as_str()),
            ("Historical Performance", self.historical_performance.as_str()),
        ]
    }

    /// Applies a partial update. `None` leaves the field as is.
    pub fn apply(&mut self, patch: ProductPatch) {
        let ProductPatch {
            name,
            description,
            features,
            benefits,
            target_audience,
            risk_level,
            minimum_investment,
            return_rate,
            additional_info,
            faqs,
            historical_performance,
        } = patch;
        let targets = [
            (&mut self.name, name),
            (&mut self.description, description),
            (&mut self.features, features),
            (&mut self.benefits, benefits),
            (&mut self.target_audience, target_audience),
            (&mut self.risk_level, risk_level),
            (&mut self.minimum_investment, minimum_investment),
            (&mut self.return_rate, return_rate),
            (&mut self.additional_info, additional_info),
            (&mut self.faqs, faqs),
            (&mut self.historical_performance, historical_performance),
        ];
        for (field, value) in targets {
            if let Some(value) = value {
                *field = value;
            }
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub features: Option<String>,
    pub benefits: Option<String>,
    pub target_audience: Option<String>,
    pub risk_level: Option<String>,
    pub minimum_investment: Option<String>,
    pub return_rate: Option<String>,
    pub additional_info: Option<String>,
    pub faqs: Option<String>,
    pub historical_performance: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    #[serde(rename = "danaPlus")]
    pub dana_plus: ProductInfo,
    pub reksadana: ProductInfo,
    #[serde(rename = "eMAS")]
    pub emas: ProductInfo,
}

impl KnowledgeBase {
    pub fn product(&self, key: ProductKey) -> &ProductInfo {
        match key {
            ProductKey::DanaPlus => &self.dana_plus,
            ProductKey::Reksadana => &self.reksadana,
            ProductKey::Emas => &self.emas,
        }
    }

    pub fn product_mut(&mut self, key: ProductKey) -> &mut ProductInfo {
        match key {
            ProductKey::DanaPlus => &mut self.dana_plus,
            ProductKey::Reksadana => &mut self.reksadana,
            ProductKey::Emas => &mut self.emas,
        }
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self {
            dana_plus: ProductInfo {
                name: "DANA+".into(),
                description: "DANA+ is a digital savings product that offers higher returns than traditional savings accounts with the flexibility to withdraw anytime.".into(),
                features: "No minimum balance, Daily interest calculation, Withdraw anytime, No admin fees".into(),
                benefits: "Higher returns than traditional savings, Flexibility to access funds, Easy to manage through the DANA app".into(),
                target_audience: "Young professionals, Digital natives, First-time savers".into(),
                risk_level: "Low".into(),
                minimum_investment: "Rp 10,000".into(),
                return_rate: "3-4% p.a.".into(),
                additional_info: "DANA+ is protected by LPS (Indonesia Deposit Insurance Corporation) up to Rp 2 billion.".into(),
                faqs: "Q: How do I start using DANA+?\nA: Open the DANA app, go to the DANA+ section, and follow the instructions to transfer funds.\n\nQ: Is there a lock-in period?\nA: No, funds can be withdrawn anytime without penalty.".into(),
                historical_performance: "2022: 3.5%\n2021: 3.2%\n2020: 4.0%".into(),
            },
            reksadana: ProductInfo {
                name: "Reksa Dana".into(),
                description: "Reksa Dana (Mutual Funds) pools money from many investors into a diversified portfolio managed by professional fund managers.".into(),
                features: "Professional management, Diversification, Various fund types (Money Market, Fixed Income, Equity, Mixed)".into(),
                benefits: "Potential for higher returns than savings, Professional portfolio management, Diversification to reduce risk".into(),
                target_audience: "Medium to long-term investors, Those seeking higher returns than deposits, Investors with moderate risk tolerance".into(),
                risk_level: "Low to High (depending on fund type)".into(),
                minimum_investment: "Rp 100,000".into(),
                return_rate: "5-15% p.a. (varies by fund type)".into(),
                additional_info: "Reksa Dana is regulated by OJK (Financial Services Authority of Indonesia).".into(),
                faqs: "Q: What types of Reksa Dana are available?\nA: Money Market, Fixed Income, Equity, and Mixed funds for different risk profiles.\n\nQ: How long should I invest in Reksa Dana?\nA: Generally 1-5+ years depending on the fund type.".into(),
                historical_performance: "Money Market Fund:\n2022: 4.8%\n2021: 4.5%\n2020: 5.2%\n\nEquity Fund:\n2022: 8.7%\n2021: 12.3%\n2020: -2.5% (COVID impact)".into(),
            },
            emas: ProductInfo {
                name: "eMAS".into(),
                description: "eMAS is a digital gold investment product to buy, sell, and store gold through the DANA app.".into(),
                features: "Buy gold starting from 0.0001 grams, Real-time gold price updates, Secure digital storage, Physical gold delivery option".into(),
                benefits: "Hedge against inflation, Portfolio diversification, No need for physical storage, Buy/sell anytime".into(),
                target_audience: "Long-term investors, Those seeking inflation protection, Gold enthusiasts".into(),
                risk_level: "Medium".into(),
                minimum_investment: "As low as Rp 5,000".into(),
                return_rate: "Based on gold price appreciation".into(),
                additional_info: "Gold is stored in secure vaults and is 99.99% pure gold certified by ANTAM.".into(),
                faqs: "Q: Can I convert my digital gold to physical gold?\nA: Yes, physical delivery is available from 1 gram.\n\nQ: How is the gold price determined?\nA: It follows international gold prices with a small buy/sell spread.".into(),
                historical_performance: "2022: 7.2%\n2021: -3.5%\n2020: 24.6%\n2019: 18.3%\n\nNote: Gold can be volatile but has historically been a good store of value over long periods.".into(),
            },
        }
    }
}

//! Built-in project profiles and category names used by the skill selector.
//! `[[projects]]` and `[categories]` in skillkit.toml replace these wholesale.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectProfile {
    pub key: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub essential: Vec<String>,
    #[serde(default)]
    pub important: Vec<String>,
    #[serde(default)]
    pub optional: Vec<String>,
}

struct ProfileDef {
    key: &'static str,
    name: &'static str,
    description: &'static str,
    essential: &'static [&'static str],
    important: &'static [&'static str],
    optional: &'static [&'static str],
}

const PROFILES: &[ProfileDef] = &[
    ProfileDef {
        key: "1",
        name: "SaaS Application",
        description: "B2B/B2C Software as a Service",
        essential: &[
            "01-foundations/typescript-standards",
            "01-foundations/python-standards",
            "02-frontend/nextjs-patterns",
            "03-backend-api/nodejs-api",
            "04-database/prisma-guide",
            "10-authentication-authorization/jwt-authentication",
            "18-project-management/agile-scrum",
            "19-seo-optimization/technical-seo",
            "21-documentation/technical-writing",
        ],
        important: &[
            "11-billing-subscription/stripe-integration",
            "11-billing-subscription/usage-metering",
            "12-compliance-governance/pdpa-compliance",
            "14-monitoring-observability/prometheus-metrics",
            "15-devops-infrastructure/docker-patterns",
            "28-marketing-integration/email-marketing",
            "29-customer-support/helpdesk-integration",
        ],
        optional: &[
            "17-domain-specific/multi-tenancy",
            "20-ai-integration/chatbot-integration",
            "34-real-time-features/websocket-patterns",
        ],
    },
    ProfileDef {
        key: "2",
        name: "E-commerce Platform",
        description: "Online store with payments and inventory",
        essential: &[
            "01-foundations/typescript-standards",
            "02-frontend/nextjs-patterns",
            "03-backend-api/nodejs-api",
            "04-database/prisma-guide",
            "10-authentication-authorization/jwt-authentication",
            "11-billing-subscription/stripe-integration",
            "13-file-storage/s3-integration",
            "30-ecommerce/shopping-cart",
            "30-ecommerce/payment-gateways",
            "30-ecommerce/order-management",
        ],
        important: &[
            "12-compliance-governance/pdpa-compliance",
            "15-devops-infrastructure/kubernetes-deployment",
            "19-seo-optimization/nextjs-seo",
            "28-marketing-integration/email-marketing",
            "30-ecommerce/inventory-management",
            "30-ecommerce/shipping-integration",
        ],
        optional: &[
            "14-monitoring-observability/grafana-dashboards",
            "29-customer-support/live-chat",
        ],
    },
    ProfileDef {
        key: "3",
        name: "Mobile Application",
        description: "iOS/Android mobile app",
        essential: &[
            "01-foundations/typescript-standards",
            "03-backend-api/fastapi-patterns",
            "04-database/mongodb-patterns",
            "10-authentication-authorization/jwt-authentication",
            "31-mobile-development/react-native-patterns",
            "31-mobile-development/push-notifications",
        ],
        important: &[
            "13-file-storage/s3-integration",
            "14-monitoring-observability/error-tracking",
            "15-devops-infrastructure/ci-cd-github-actions",
            "31-mobile-development/offline-mode",
            "31-mobile-development/deep-linking",
        ],
        optional: &[
            "11-billing-subscription/stripe-integration",
            "20-ai-integration/chatbot-integration",
            "34-real-time-features/presence-detection",
        ],
    },
    ProfileDef {
        key: "4",
        name: "AI/ML Product",
        description: "Machine learning powered application",
        essential: &[
            "01-foundations/python-standards",
            "03-backend-api/fastapi-patterns",
            "04-database/vector-database",
            "05-ai-ml-core/pytorch-deployment",
            "06-ai-ml-production/llm-integration",
            "06-ai-ml-production/rag-implementation",
        ],
        important: &[
            "05-ai-ml-core/model-training",
            "05-ai-ml-core/data-preprocessing",
            "13-file-storage/s3-integration",
            "14-monitoring-observability/prometheus-metrics",
            "15-devops-infrastructure/kubernetes-deployment",
            "20-ai-integration/ai-agents",
            "39-data-science-ml/ml-serving",
        ],
        optional: &[
            "07-document-processing/ocr-paddleocr",
            "19-seo-optimization/technical-seo",
            "21-documentation/api-documentation",
        ],
    },
    ProfileDef {
        key: "5",
        name: "IoT Platform",
        description: "Internet of Things device management",
        essential: &[
            "01-foundations/python-standards",
            "03-backend-api/nodejs-api",
            "04-database/timescaledb",
            "08-messaging-queue/mqtt-integration",
            "36-iot-integration/iot-protocols",
            "36-iot-integration/device-management",
        ],
        important: &[
            "14-monitoring-observability/grafana-dashboards",
            "15-devops-infrastructure/docker-patterns",
            "34-real-time-features/real-time-dashboard",
            "36-iot-integration/sensor-data-processing",
            "36-iot-integration/iot-security",
        ],
        optional: &[
            "06-ai-ml-production/llm-integration",
            "36-iot-integration/edge-computing",
            "39-data-science-ml/data-pipeline",
        ],
    },
    ProfileDef {
        key: "6",
        name: "Gaming Platform",
        description: "Multiplayer gaming or game platform",
        essential: &[
            "01-foundations/typescript-standards",
            "03-backend-api/nodejs-api",
            "04-database/redis-caching",
            "08-messaging-queue/redis-queue",
            "34-real-time-features/websocket-patterns",
            "38-gaming-features/leaderboards",
            "38-gaming-features/real-time-multiplayer",
        ],
        important: &[
            "10-authentication-authorization/jwt-authentication",
            "11-billing-subscription/stripe-integration",
            "14-monitoring-observability/prometheus-metrics",
            "15-devops-infrastructure/kubernetes-deployment",
            "38-gaming-features/achievements",
            "38-gaming-features/matchmaking",
        ],
        optional: &[
            "13-file-storage/cdn-integration",
            "37-video-streaming/live-streaming",
            "38-gaming-features/in-game-purchases",
        ],
    },
    ProfileDef {
        key: "7",
        name: "Video Platform",
        description: "Video hosting and streaming service",
        essential: &[
            "01-foundations/typescript-standards",
            "03-backend-api/nodejs-api",
            "04-database/prisma-guide",
            "13-file-storage/s3-integration",
            "37-video-streaming/video-upload-processing",
            "37-video-streaming/adaptive-bitrate",
        ],
        important: &[
            "10-authentication-authorization/jwt-authentication",
            "14-monitoring-observability/prometheus-metrics",
            "15-devops-infrastructure/kubernetes-deployment",
            "34-real-time-features/websocket-patterns",
            "37-video-streaming/video-transcoding",
            "37-video-streaming/cdn-delivery",
        ],
        optional: &[
            "11-billing-subscription/subscription-plans",
            "20-ai-integration/ai-search",
            "37-video-streaming/live-streaming",
        ],
    },
    ProfileDef {
        key: "8",
        name: "Web3/Blockchain Application",
        description: "Decentralized application (dApp)",
        essential: &[
            "01-foundations/typescript-standards",
            "02-frontend/nextjs-patterns",
            "03-backend-api/nodejs-api",
            "35-blockchain-web3/web3-integration",
            "35-blockchain-web3/wallet-connection",
            "35-blockchain-web3/smart-contracts",
        ],
        important: &[
            "10-authentication-authorization/jwt-authentication",
            "13-file-storage/s3-integration",
            "14-monitoring-observability/error-tracking",
            "15-devops-infrastructure/docker-patterns",
            "35-blockchain-web3/blockchain-authentication",
        ],
        optional: &[
            "11-billing-subscription/stripe-integration",
            "34-real-time-features/websocket-patterns",
            "35-blockchain-web3/nft-integration",
            "35-blockchain-web3/cryptocurrency-payment",
        ],
    },
    ProfileDef {
        key: "9",
        name: "Content Management System",
        description: "Headless CMS or publishing platform",
        essential: &[
            "01-foundations/typescript-standards",
            "02-frontend/nextjs-patterns",
            "03-backend-api/nodejs-api",
            "04-database/prisma-guide",
            "33-content-management/headless-cms",
            "33-content-management/media-library",
        ],
        important: &[
            "10-authentication-authorization/rbac-patterns",
            "13-file-storage/cdn-integration",
            "19-seo-optimization/nextjs-seo",
            "21-documentation/user-guides",
            "33-content-management/content-versioning",
        ],
        optional: &[
            "20-ai-integration/ai-search",
            "22-ux-ui-design/design-systems",
            "34-real-time-features/collaborative-editing",
        ],
    },
    ProfileDef {
        key: "10",
        name: "Custom/Other",
        description: "Browse all categories",
        essential: &[],
        important: &[],
        optional: &[],
    },
];

const CATEGORIES: &[(&str, &str)] = &[
    ("01", "Foundations"),
    ("02", "Frontend Development"),
    ("03", "Backend API"),
    ("04", "Database"),
    ("05", "AI/ML Core"),
    ("06", "AI/ML Production"),
    ("07", "Document Processing"),
    ("08", "Messaging & Queue"),
    ("09", "Microservices"),
    ("10", "Authentication & Authorization"),
    ("11", "Billing & Subscription"),
    ("12", "Compliance & Governance"),
    ("13", "File Storage"),
    ("14", "Monitoring & Observability"),
    ("15", "DevOps & Infrastructure"),
    ("16", "Testing"),
    ("17", "Domain-Specific"),
    ("18", "Project Management"),
    ("19", "SEO Optimization"),
    ("20", "AI Integration"),
    ("21", "Documentation"),
    ("22", "UX/UI Design"),
    ("28", "Marketing Integration"),
    ("29", "Customer Support"),
    ("30", "E-commerce"),
    ("31", "Mobile Development"),
    ("32", "CRM Integration"),
    ("33", "Content Management"),
    ("34", "Real-time Features"),
    ("35", "Blockchain/Web3"),
    ("36", "IoT Integration"),
    ("37", "Video Streaming"),
    ("38", "Gaming Features"),
    ("39", "Data Science/ML"),
    ("40", "System Resilience"),
];

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn builtin_profiles() -> Vec<ProjectProfile> {
    PROFILES
        .iter()
        .map(|p| ProjectProfile {
            key: p.key.to_string(),
            name: p.name.to_string(),
            description: p.description.to_string(),
            essential: owned(p.essential),
            important: owned(p.important),
            optional: owned(p.optional),
        })
        .collect()
}

pub fn builtin_categories() -> BTreeMap<String, String> {
    CATEGORIES
        .iter()
        .map(|(code, name)| (code.to_string(), name.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_profiles_are_unique_and_reference_known_categories() {
        let profiles = builtin_profiles();
        let categories = builtin_categories();
        let keys: std::collections::HashSet<&str> =
            profiles.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys.len(), profiles.len());
        assert_eq!(keys.len(), 10);

        for profile in &profiles {
            for skill in profile
                .essential
                .iter()
                .chain(&profile.important)
                .chain(&profile.optional)
            {
                let code = &skill[..2];
                assert!(categories.contains_key(code), "{} has unknown category", skill);
            }
        }
    }
}

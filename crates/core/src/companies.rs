//! Static company catalog.

use serde::Serialize;

/// Logo served when a company is not in the catalog.
pub const PLACEHOLDER_LOGO: &str = "/static/logos/placeholder.png";

/// A company that feedback can be filed against.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Company {
    /// Display name, also the value stored on feedback rows.
    pub name: &'static str,
    /// Primary web domain.
    pub domain: &'static str,
    /// Logo URL path.
    pub logo: &'static str,
}

const CATALOG: [Company; 10] = [
    Company {
        name: "Google",
        domain: "google.com",
        logo: "/static/logos/google.png",
    },
    Company {
        name: "Apple",
        domain: "apple.com",
        logo: "/static/logos/apple.png",
    },
    Company {
        name: "Microsoft",
        domain: "microsoft.com",
        logo: "/static/logos/microsoft.png",
    },
    Company {
        name: "Amazon",
        domain: "amazon.com",
        logo: "/static/logos/amazon.png",
    },
    Company {
        name: "Netflix",
        domain: "netflix.com",
        logo: "/static/logos/netflix.png",
    },
    Company {
        name: "Tesla",
        domain: "tesla.com",
        logo: "/static/logos/tesla.png",
    },
    Company {
        name: "Meta",
        domain: "meta.com",
        logo: "/static/logos/meta.png",
    },
    Company {
        name: "Twitter",
        domain: "twitter.com",
        logo: "/static/logos/twitter.png",
    },
    Company {
        name: "Uber",
        domain: "uber.com",
        logo: "/static/logos/uber.png",
    },
    Company {
        name: "Adobe",
        domain: "adobe.com",
        logo: "/static/logos/adobe.png",
    },
];

/// All known companies, in display order.
#[must_use]
pub fn all() -> &'static [Company] {
    &CATALOG
}

/// Logo URL for a company name. Names outside the catalog get the
/// placeholder; matching is exact.
#[must_use]
pub fn resolve_logo(name: &str) -> &'static str {
    CATALOG
        .iter()
        .find(|company| company.name == name)
        .map_or(PLACEHOLDER_LOGO, |company| company.logo)
}

use crate::NewProduct;

/// One entry of the catalogue seeded at registration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    /// Percent, e.g. `15.0`.
    pub commission_rate: f64,
}

pub const DEFAULT_CATALOG: [CatalogEntry; 8] = [
    CatalogEntry {
        name: "Seguro Auto",
        category: "auto",
        description: "Proteção completa para seu veículo",
        commission_rate: 15.0,
    },
    CatalogEntry {
        name: "Seguro Residencial",
        category: "residencial",
        description: "Proteção para seu lar e patrimônio",
        commission_rate: 12.0,
    },
    CatalogEntry {
        name: "Seguro Empresarial",
        category: "empresarial",
        description: "Proteção completa para sua empresa",
        commission_rate: 18.0,
    },
    CatalogEntry {
        name: "Seguro Vida",
        category: "vida",
        description: "Proteção financeira para sua família",
        commission_rate: 20.0,
    },
    CatalogEntry {
        name: "Plano de Saúde",
        category: "saude",
        description: "Assistência médica completa",
        commission_rate: 25.0,
    },
    CatalogEntry {
        name: "Consórcio",
        category: "consorcio",
        description: "Realize seus sonhos com parcelas planejadas",
        commission_rate: 10.0,
    },
    CatalogEntry {
        name: "Previdência Privada",
        category: "previdencia",
        description: "Planeje seu futuro com segurança",
        commission_rate: 15.0,
    },
    CatalogEntry {
        name: "Seguro Viagem",
        category: "viagem",
        description: "Viaje com tranquilidade e segurança",
        commission_rate: 8.0,
    },
];

impl From<&CatalogEntry> for NewProduct {
    fn from(entry: &CatalogEntry) -> Self {
        NewProduct {
            name: entry.name.to_string(),
            category: entry.category.to_string(),
            description: Some(entry.description.to_string()),
            commission_rate: Some(entry.commission_rate),
            active: Some(true),
        }
    }
}

pub fn default_catalog() -> Vec<NewProduct> {
    DEFAULT_CATALOG.iter().map(NewProduct::from).collect()
}

#[cfg(test)]
mod tests {
    use jarvis_query::Resource;

    use super::*;
    use crate::Product;

    #[test]
    fn seeded_catalogue_is_valid_and_distinct() {
        let seeded = default_catalog();
        assert_eq!(seeded.len(), 8);
        for p in &seeded {
            Product::validate_new(p).unwrap();
        }

        let mut categories: Vec<_> = seeded.iter().map(|p| p.category.as_str()).collect();
        categories.sort();
        categories.dedup();
        assert_eq!(categories.len(), 8);
    }
}

use clap::Args;
use spelunker_query::{
    default_filters_from_query, facets_from_query, pagination_from_query, Facet, Filter,
    PaginationOptions, QueryParams,
};

/// Pagination, filter and facet flags shared by every listing subcommand.
///
/// The flags are decoded exactly like the query string of a web request.
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Page number
    #[arg(long)]
    pub page: Option<i64>,

    /// Results per page
    #[arg(long)]
    pub per_page: Option<i64>,

    /// Continuation token from a previous page, instead of --page
    #[arg(long, conflicts_with = "page")]
    pub cursor: Option<String>,

    /// Only include records with this placetype
    #[arg(long)]
    pub placetype: Vec<String>,

    /// Only include records in this country
    #[arg(long)]
    pub country: Vec<String>,

    /// Only include records with this tag
    #[arg(long)]
    pub tag: Vec<String>,

    /// Only include records that are (1), are not (0) or may be (-1) current
    #[arg(long, allow_hyphen_values = true)]
    pub iscurrent: Option<String>,

    /// Only include records that are (1), are not (0) or may be (-1) deprecated
    #[arg(long, allow_hyphen_values = true)]
    pub isdeprecated: Option<String>,

    /// Count results per value of this property instead of listing them
    #[arg(long)]
    pub facet: Vec<String>,
}

/// A decoded listing request
#[derive(Debug, Clone)]
pub struct ListRequest {
    pub pagination: PaginationOptions,
    pub filters: Vec<Filter>,
    pub facets: Vec<Facet>,
}

impl ListArgs {
    pub fn query(&self) -> QueryParams {
        let mut pairs: Vec<(&str, String)> = Vec::new();

        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }

        if let Some(per_page) = self.per_page {
            pairs.push(("per_page", per_page.to_string()));
        }

        if let Some(cursor) = &self.cursor {
            pairs.push(("cursor", cursor.clone()));
        }

        pairs.extend(self.placetype.iter().map(|v| ("placetype", v.clone())));
        pairs.extend(self.country.iter().map(|v| ("country", v.clone())));
        pairs.extend(self.tag.iter().map(|v| ("tag", v.clone())));

        if let Some(flag) = &self.iscurrent {
            pairs.push(("iscurrent", flag.clone()));
        }

        if let Some(flag) = &self.isdeprecated {
            pairs.push(("isdeprecated", flag.clone()));
        }

        pairs.extend(self.facet.iter().map(|v| ("facet", v.clone())));

        QueryParams::from_pairs(pairs)
    }

    pub fn request(&self) -> anyhow::Result<ListRequest> {
        let query = self.query();

        Ok(ListRequest {
            pagination: pagination_from_query(&query)?,
            filters: default_filters_from_query(&query)?,
            facets: facets_from_query(&query)?,
        })
    }
}

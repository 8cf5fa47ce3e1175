//! Cart view logic: facets, contents, downloads and the cart store itself.

pub mod facet_aggregator;
pub use facet_aggregator::{AggregationProgress, FacetAccumulator, FacetAggregator};

pub mod refresh;
pub use refresh::{ContentsRefresher, FacetRefresher, LatestRun, RefreshOutcome};

pub mod cart_contents;
pub use cart_contents::{CartContents, retrieve_cart_contents};

pub mod batch_download;
pub use batch_download::{DownloadedFile, batch_download, batch_download_logged};

pub mod cart_store;
pub use cart_store::{CartStore, CartSync};

mod add_all;
pub use add_all::{add_all_query, add_all_search_results};

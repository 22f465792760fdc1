use crate::{
    spotify::gateway::{ApiError, RequestGateway},
    types::{
        Album, AvailableGenresResponse, CategoriesResponse, Category, CategoryPlaylistsResponse,
        FeaturedPlaylistsResponse, HomeFeed, NewReleasesResponse, Playlist,
        RecommendationsResponse, Track,
    },
    utils, warning,
};

impl RequestGateway {
    /// `GET /browse/new-releases`
    pub async fn new_releases(&self, limit: u32) -> Result<Vec<Album>, ApiError> {
        let res: NewReleasesResponse = self
            .get("/browse/new-releases", &[("limit", limit.to_string())])
            .await?;
        Ok(res.albums.items)
    }

    /// `GET /browse/featured-playlists`
    pub async fn featured_playlists(&self, limit: u32) -> Result<Vec<Playlist>, ApiError> {
        let res: FeaturedPlaylistsResponse = self
            .get("/browse/featured-playlists", &[("limit", limit.to_string())])
            .await?;
        Ok(res.playlists.items)
    }

    /// `GET /browse/categories`
    pub async fn categories(&self, limit: u32) -> Result<Vec<Category>, ApiError> {
        let res: CategoriesResponse = self
            .get("/browse/categories", &[("limit", limit.to_string())])
            .await?;
        Ok(res.categories.items)
    }

    /// `GET /browse/categories/{id}/playlists`
    pub async fn category_playlists(
        &self,
        category_id: &str,
        limit: u32,
    ) -> Result<Vec<Playlist>, ApiError> {
        let path = format!("/browse/categories/{category_id}/playlists");
        let res: CategoryPlaylistsResponse =
            self.get(&path, &[("limit", limit.to_string())]).await?;
        Ok(res.playlists.items)
    }

    /// `GET /recommendations/available-genre-seeds`
    pub async fn recommended_genres(&self) -> Result<Vec<String>, ApiError> {
        let res: AvailableGenresResponse = self
            .get("/recommendations/available-genre-seeds", &[])
            .await?;
        Ok(res.genres)
    }

    /// `GET /recommendations` seeded with the given genres.
    pub async fn recommendations<I, G>(&self, genres: I, limit: u32) -> Result<Vec<Track>, ApiError>
    where
        I: IntoIterator<Item = G>,
        G: AsRef<str>,
    {
        let seeds = genres
            .into_iter()
            .map(|g| g.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(",");
        let res: RecommendationsResponse = self
            .get(
                "/recommendations",
                &[("limit", limit.to_string()), ("seed_genres", seeds)],
            )
            .await?;
        Ok(res.tracks)
    }

    /// Recommended tracks for up to five random genre seeds.
    pub async fn recommended_tracks(&self, limit: u32) -> Result<Vec<Track>, ApiError> {
        let genres = self.recommended_genres().await?;
        let seeds = utils::pick_genre_seeds(&genres);
        if seeds.is_empty() {
            return Ok(Vec::new());
        }
        self.recommendations(&seeds, limit).await
    }

    /// Loads new releases, featured playlists and recommendations side by side.
    ///
    /// New releases and featured playlists are required; recommendations are
    /// best effort because the genre seed endpoint is not available to every
    /// application.
    pub async fn home_feed(&self) -> Result<HomeFeed, ApiError> {
        let (new_releases, featured_playlists, recommended_tracks) = tokio::join!(
            self.new_releases(50),
            self.featured_playlists(10),
            self.recommended_tracks(10),
        );

        let mut new_releases = new_releases?;
        utils::remove_duplicate_albums(&mut new_releases);
        let mut featured_playlists = featured_playlists?;
        utils::remove_duplicate_playlists(&mut featured_playlists);

        let recommended_tracks = recommended_tracks.unwrap_or_else(|e| {
            warning!("Recommendations unavailable: {}", e);
            Vec::new()
        });

        Ok(HomeFeed {
            new_releases,
            featured_playlists,
            recommended_tracks,
        })
    }
}

use crate::proto::list_workspaces_request::Scope;
use crate::proto::ListWorkspacesRequest;
use crate::Error;
use crate::Result;
use crate::WorkspaceInfo;

/// Rows per page when the caller does not ask for a size
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Store-level filter for listing the caller's workspaces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceQuery {
    /// `None` lists across organizations
    pub organization_id: Option<String>,
    pub pinned_only: bool,
    pub search_term: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for WorkspaceQuery {
    fn default() -> Self {
        Self {
            organization_id: None,
            pinned_only: false,
            search_term: None,
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl WorkspaceQuery {
    pub fn matches(
        &self,
        info: &WorkspaceInfo,
    ) -> bool {
        if let Some(organization_id) = &self.organization_id {
            if &info.organization_id != organization_id {
                return false;
            }
        }
        if self.pinned_only && !info.pinned {
            return false;
        }
        match &self.search_term {
            Some(term) => info.context_url.to_lowercase().contains(&term.to_lowercase()),
            None => true,
        }
    }
}

impl TryFrom<&ListWorkspacesRequest> for WorkspaceQuery {
    type Error = Error;

    /// Organization-scoped listings (the default scope included) must name
    /// the organization.
    fn try_from(request: &ListWorkspacesRequest) -> Result<Self> {
        let organization_id = match request.scope() {
            Scope::Unspecified | Scope::MyWorkspacesInOrganization | Scope::AllWorkspacesInOrganization => {
                if request.organization_id.is_empty() {
                    return Err(Error::invalid_argument("organization_id is required"));
                }
                Some(request.organization_id.clone())
            }
            Scope::AllWorkspacesInInstallation => {
                (!request.organization_id.is_empty()).then(|| request.organization_id.clone())
            }
        };

        let (page_size, page) = request
            .pagination
            .as_ref()
            .map(|p| (p.page_size, p.page))
            .unwrap_or_default();
        let limit = usize::try_from(page_size)
            .ok()
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE);
        let offset = usize::try_from(page).unwrap_or(0).saturating_mul(limit);

        Ok(Self {
            organization_id,
            pinned_only: request.pinned == Some(true),
            search_term: (!request.search_term.is_empty()).then(|| request.search_term.clone()),
            limit,
            offset,
        })
    }
}

/// One page of a listing plus the number of matching rows
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkspacePage {
    pub rows: Vec<WorkspaceInfo>,
    pub total: usize,
}

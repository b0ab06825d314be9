use tracing::{info, warn};

use super::{
    dto::{RoomForm, RoomRegistration, RoomSummary},
    images,
    repo_types::Host,
};
use crate::{
    error::{AppError, Conflict, Missing},
    state::AppState,
    users::repo_types::User,
};

/// Grants the host capability. Repeated calls return the existing record
/// with `false`.
pub async fn register_host(st: &AppState, user: &User) -> Result<(Host, bool), AppError> {
    let (host, created) = st.hosts.get_or_create(user.id).await?;
    if created {
        info!(user_id = user.id, host_id = host.id, "host registered");
    }
    Ok((host, created))
}

/// Referenced catalog rows must exist. Checked in order: category, room
/// type, facilities.
async fn ensure_references(st: &AppState, reg: &RoomRegistration) -> Result<(), AppError> {
    if !st.rooms.category_exists(reg.room.category_id).await? {
        return Err(AppError::NotFound(Missing::Category));
    }
    if !st.rooms.room_type_exists(reg.room.room_type_id).await? {
        return Err(AppError::NotFound(Missing::RoomType));
    }
    if !reg.facility_ids.is_empty() {
        let found = st.rooms.count_facilities(&reg.facility_ids).await?;
        if found != reg.facility_ids.len() as i64 {
            return Err(AppError::NotFound(Missing::Facility));
        }
    }
    Ok(())
}

/// Registers a room for the caller's host record.
///
/// Images are uploaded before the database is touched; the room row, its
/// facility links and image rows are then written, and the summary read back,
/// in a single transaction.
/// When that write does not commit, the uploaded objects are deleted again,
/// so a failed call leaves neither rows nor objects behind.
pub async fn register_room(
    st: &AppState,
    user: &User,
    form: RoomForm,
) -> Result<RoomSummary, AppError> {
    let host = st.hosts.find_by_user(user.id).await?.ok_or_else(|| {
        warn!(user_id = user.id, "room registration by non-host");
        AppError::HostNotFound
    })?;

    let reg = form.into_registration()?;
    ensure_references(st, &reg).await?;

    // Fast path only; the insert below is what actually enforces uniqueness.
    if st.rooms.room_name_exists(&reg.room.name).await? {
        return Err(AppError::Conflict(Conflict::RoomName));
    }

    let RoomRegistration {
        room,
        facility_ids,
        files,
    } = reg;

    let stored = images::upload_all(st, host.id, files).await?;
    let urls: Vec<String> = stored.iter().map(|s| s.url.clone()).collect();

    let details = match st
        .rooms
        .create_room(host.id, &room, &facility_ids, &urls)
        .await
    {
        Ok(details) => details,
        Err(e) => {
            warn!(host_id = host.id, room = %room.name, error = %e, "room insert failed; discarding uploads");
            images::discard(st, &stored).await;
            return Err(e.into());
        }
    };

    info!(
        host_id = host.id,
        room_id = details.room.id,
        facilities = facility_ids.len(),
        images = urls.len(),
        "room registered"
    );
    Ok(details.into())
}

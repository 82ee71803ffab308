use super::widget::with_widget;
use crate::permissions::PermissionInfo;
use tauri::command;

/// Permission outcome of the widget's camera discovery
#[command]
pub async fn get_permission_status() -> Result<PermissionInfo, String> {
    with_widget(|widget| {
        let info = widget.permission_info();
        log::debug!("Permission status: {} ({})", info.status, info.message);
        Ok(info)
    })
    .await
}

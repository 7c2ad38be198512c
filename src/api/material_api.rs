// ==========================================
// 仓库物资管理系统 - 物资主数据 API
// ==========================================
// 职责: 物资主数据维护 (创建/更新/查询)
// 说明: 编码唯一性在本层做前置检查并转成业务错误,
//       数据库唯一索引兜底
// ==========================================

use std::sync::Arc;

use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::material::{Material, NewMaterial};
use crate::repository::material_repo::MaterialRepository;

// ==========================================
// MaterialApi - 物资主数据 API
// ==========================================
pub struct MaterialApi {
    material_repo: Arc<MaterialRepository>,
}

impl MaterialApi {
    /// 创建新的MaterialApi实例
    pub fn new(material_repo: Arc<MaterialRepository>) -> Self {
        Self { material_repo }
    }

    /// 创建物资
    pub fn create_material(&self, new: NewMaterial) -> ApiResult<Material> {
        self.validate(&new)?;

        if let Some(existing) = self.material_repo.find_by_code(&new.code)? {
            return Err(ApiError::BusinessRuleViolation(format!(
                "物资编码 {} 已被占用 (id={})",
                new.code, existing.id
            )));
        }

        let material = self.material_repo.insert(&new)?;
        info!(material_id = material.id, code = %material.code, "物资已创建");
        Ok(material)
    }

    /// 更新物资
    pub fn update_material(&self, id: i64, new: NewMaterial) -> ApiResult<Material> {
        self.validate(&new)?;

        // 改码时检查新编码未被其他物资占用
        if let Some(existing) = self.material_repo.find_by_code(&new.code)? {
            if existing.id != id {
                return Err(ApiError::BusinessRuleViolation(format!(
                    "物资编码 {} 已被占用 (id={})",
                    new.code, existing.id
                )));
            }
        }

        let material = self.material_repo.update(id, &new)?;
        info!(material_id = material.id, code = %material.code, "物资已更新");
        Ok(material)
    }

    /// 按 id 查询物资
    pub fn get_material(&self, id: i64) -> ApiResult<Material> {
        self.material_repo
            .find_by_id(id)?
            .ok_or_else(|| ApiError::NotFound(format!("Material(id={})不存在", id)))
    }

    /// 查询物资列表
    pub fn list_materials(
        &self,
        search: Option<&str>,
        only_active: bool,
    ) -> ApiResult<Vec<Material>> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        Ok(self.material_repo.list(search, only_active)?)
    }

    fn validate(&self, new: &NewMaterial) -> ApiResult<()> {
        if new.code.trim().is_empty() {
            return Err(ApiError::ValidationError("物资编码不能为空".to_string()));
        }
        if new.description.trim().is_empty() {
            return Err(ApiError::ValidationError("物资描述不能为空".to_string()));
        }
        if new.unit_cost < 0.0 {
            return Err(ApiError::ValidationError(format!(
                "单位成本不能为负: {}",
                new.unit_cost
            )));
        }
        if new.stock_min < 0.0 {
            return Err(ApiError::ValidationError(format!(
                "最低库存不能为负: {}",
                new.stock_min
            )));
        }
        if let (Some(max), min) = (new.stock_max, new.stock_min) {
            if max < min {
                return Err(ApiError::ValidationError(format!(
                    "最高库存 {} 不能低于最低库存 {}",
                    max, min
                )));
            }
        }
        Ok(())
    }
}

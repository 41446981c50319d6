// src/session/courses.rs

use super::{SessionController, ordering::order_courses, scheduler::TimerKind};
use crate::models::{Course, CourseUpdate};
use log::{debug, info, warn};

impl SessionController {
    /// 整体替换课程列表
    pub(super) fn apply_courses(&mut self, mut courses: Vec<Course>) {
        for course in &mut courses {
            course.normalize_tabs();
        }
        self.scheduler.cancel(TimerKind::Reorder);
        self.courses = order_courses(&courses);
    }

    pub(super) fn reorder_courses(&mut self) {
        self.courses = order_courses(&self.courses);
    }

    /// 立即修改并推送给引擎；列表重新排序延后执行，期间再次修改会重新计时
    pub(super) async fn update_course(&mut self, id: &str, update: CourseUpdate) {
        let Some(course) = self.courses.iter_mut().find(|c| c.id == id) else {
            warn!("未找到课程 '{}'，忽略更新", id);
            return;
        };
        update.apply(course);
        let course = course.clone();
        self.scheduler
            .once(TimerKind::Reorder, self.config.timings.reorder_debounce);
        self.publish();

        self.push_course(&course).await;
    }

    /// 批量启用或禁用，立即排序
    pub(super) async fn set_all_courses(&mut self, skip: bool) {
        for course in &mut self.courses {
            course.skip = skip;
        }
        self.scheduler.cancel(TimerKind::Reorder);
        self.reorder_courses();
        self.publish();
        info!(
            "已{}全部 {} 门课程",
            if skip { "禁用" } else { "启用" },
            self.courses.len()
        );

        for course in &self.courses {
            self.push_course(course).await;
        }
    }

    async fn push_course(&self, course: &Course) {
        let config = course.course_config();
        match self.backend.update_course_config(&course.id, &config).await {
            Ok(true) => debug!("课程 '{}' 的配置已推送", course.display_name()),
            Ok(false) => warn!("引擎未接受课程 '{}' 的配置", course.display_name()),
            Err(e) => warn!("推送课程 '{}' 的配置失败: {}", course.display_name(), e),
        }
    }

    /// 从历史记录打开报告时总是重新获取
    pub(super) async fn open_report(&mut self, id: &str) {
        match self.reports.refresh(id).await {
            Some(report) => self.active_report = Some(report),
            None => debug!("未能打开报告 '{}'", id),
        }
    }
}

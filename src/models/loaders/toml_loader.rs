use crate::models::exam::ExamSheet;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从 TOML 文件加载一份试卷
pub async fn load_exam_sheet(toml_file_path: &Path) -> Result<ExamSheet> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let mut sheet: ExamSheet = toml::from_str(&content)
        .with_context(|| format!("无法解析TOML文件: {}", toml_file_path.display()))?;

    sheet.file_path = Some(toml_file_path.to_string_lossy().to_string());

    Ok(sheet)
}

/// 加载文件夹中的所有试卷
///
/// 单个文件解析失败只记录警告；按文件名排序保证处理顺序稳定
pub async fn load_all_exam_sheets(folder_path: &str) -> Result<Vec<ExamSheet>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut toml_files = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml_files.push(path);
        }
    }
    toml_files.sort();

    let mut sheets = Vec::new();
    for path in toml_files {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_exam_sheet(&path).await {
            Ok(sheet) => {
                tracing::info!("成功加载 {} 道题", sheet.questions.len());
                sheets.push(sheet);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {:#}", path.display(), e);
            }
        }
    }

    Ok(sheets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_folder(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("exam_grader_{}_{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_load_all_exam_sheets_skips_broken_files() {
        let dir = temp_folder("loader");
        std::fs::write(
            dir.join("a_biology.toml"),
            r#"
name = "Biology mock"

[[questions]]
id = "q1"
text = "Describe photosynthesis."
total_marks = 5
student_answer = "Plants use sunlight and chlorophyll for energy."
model_answer = "photosynthesis, chlorophyll, carbon dioxide, oxygen, sunlight"

[[questions]]
id = "q2"
text = "Which lens has virtual focus? A) Convex B) Concave C) Both D) None"
student_answer = "B"
"#,
        )
        .unwrap();
        std::fs::write(dir.join("b_broken.toml"), "name = ").unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let sheets = load_all_exam_sheets(dir.to_str().unwrap()).await.unwrap();
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].name, "Biology mock");
        assert_eq!(sheets[0].questions.len(), 2);
        assert_eq!(sheets[0].questions[1].total_marks, 0);
        assert!(sheets[0].questions[1].model_answer.is_none());
        assert!(sheets[0].file_path.is_some());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_missing_folder_is_an_error() {
        assert!(load_all_exam_sheets("/definitely/not/here").await.is_err());
    }
}

/// Fixed instruction sent with every chunk
///
/// The reply schema here must stay in sync with `ChunkAnalysis`.
pub const SYSTEM_PROMPT: &str = r#"你现在要分析小说文本，需要完成以下任务：
1. 识别文本中的所有角色(包括旁白)
2. 为所有文本找到说话的角色，不要因为句子中出现对应姓名就认为是说话人，要联系上下文判断。
3. 按照文章顺序为每一段内容标注序号（从1开始）,不要遗漏旁白的。
4. dialogues 中出现的每个 speaker 都必须出现在 characters 中。
请只输出JSON，格式如下：
{
    "characters": ["角色1", "角色2", ...],
    "dialogues": [
        {"id": 1, "speaker": "角色1", "content": "对话内容"},
        ...
    ]
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_names_schema_keys() {
        assert!(SYSTEM_PROMPT.contains("\"characters\""));
        assert!(SYSTEM_PROMPT.contains("\"dialogues\""));
        assert!(SYSTEM_PROMPT.contains("\"speaker\""));
        assert!(SYSTEM_PROMPT.contains("\"content\""));
    }
}
